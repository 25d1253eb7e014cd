// fetchcache library root.
// A read-through GET response cache over an async HTTP handler pipeline.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheInterceptor, CacheMetrics, CacheStore, RequestKey};
pub use config::Config;
pub use error::{Error, Result};
pub use http::{EventStream, Handler, HttpClient, HttpEvent, HttpRequest, HttpResponse, send};
