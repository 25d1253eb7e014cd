// HTTP module.
// Request/response model, the handler pipeline, and the reqwest-backed network handler.

pub mod client;
pub mod handler;
pub mod request;
pub mod response;

pub use client::HttpClient;
pub use handler::{EventStream, Handler, send};
pub use request::HttpRequest;
pub use response::{HttpEvent, HttpResponse};
