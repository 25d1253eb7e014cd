// Request handler pipeline.
// A handler turns a request into a stream of response events.

use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};

use crate::error::{Error, Result};

use super::request::HttpRequest;
use super::response::{HttpEvent, HttpResponse};

/// Stream of events produced for one request.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<HttpEvent>> + Send + 'static>>;

/// Something that can dispatch a request.
///
/// Implementations return immediately; work happens as the stream is polled.
/// A successful stream ends with exactly one [`HttpEvent::Response`]. Failures
/// are reported as an `Err` item, after which the stream ends.
pub trait Handler: Send + Sync {
    fn handle(&self, request: HttpRequest) -> EventStream;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn handle(&self, request: HttpRequest) -> EventStream {
        (**self).handle(request)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn handle(&self, request: HttpRequest) -> EventStream {
        (**self).handle(request)
    }
}

/// Dispatch a request and wait for its terminal response.
pub async fn send<H: Handler + ?Sized>(handler: &H, request: HttpRequest) -> Result<HttpResponse> {
    let mut events = handler.handle(request);

    while let Some(event) = events.next().await {
        if let HttpEvent::Response(response) = event? {
            return Ok(response);
        }
    }

    Err(Error::NoResponse)
}
