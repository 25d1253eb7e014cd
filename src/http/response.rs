// Response value and response events.
// A handler yields a stream of events that ends in a single Response.

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde_json::Value;

/// A completed HTTP response with a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    /// Final URL, when the response came from the network.
    pub url: Option<String>,
}

impl HttpResponse {
    /// A 200 response carrying only a body.
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body,
            url: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// One event in a request's lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpEvent {
    /// The request was dispatched.
    Sent,
    /// Download progress in bytes.
    Progress { loaded: u64, total: Option<u64> },
    /// Terminal success event.
    Response(HttpResponse),
}

impl HttpEvent {
    pub fn as_response(&self) -> Option<&HttpResponse> {
        match self {
            HttpEvent::Response(response) => Some(response),
            _ => None,
        }
    }

    pub fn into_response(self) -> Option<HttpResponse> {
        match self {
            HttpEvent::Response(response) => Some(response),
            _ => None,
        }
    }
}
