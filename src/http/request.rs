// Outbound request descriptor.
// Carries method, URL, query parameters, headers, and an optional JSON body.

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use url::form_urlencoded;

use crate::error::{Error, Result};

/// An outbound HTTP request as seen by the handler pipeline.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL or a path resolved against the backend's base URL.
    pub url: String,
    /// Extra query parameters, kept in insertion order.
    pub params: Vec<(String, String)>,
    /// Request headers.
    pub headers: HeaderMap,
    /// JSON body for write requests.
    pub body: Option<Value>,
}

impl HttpRequest {
    /// Create a request with no parameters, headers, or body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, url).with_body(body)
    }

    pub fn put(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, url).with_body(body)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Append a query parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Set a header, replacing any previous value.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::Other(format!("invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::Other(format!("invalid header value {value:?}: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Whether this is a read request eligible for caching.
    pub fn is_read(&self) -> bool {
        self.method == Method::GET
    }

    /// The URL with the extra query parameters appended.
    ///
    /// Parameters are form-url-encoded and joined with `&`. The separator
    /// before them is `?` when the URL has no query yet, `&` when it already
    /// has one, and nothing when the URL ends with a bare `?`.
    pub fn url_with_params(&self) -> String {
        if self.params.is_empty() {
            return self.url.clone();
        }

        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish();

        let separator = match self.url.find('?') {
            None => "?",
            Some(idx) if idx < self.url.len() - 1 => "&",
            Some(_) => "",
        };

        format!("{}{}{}", self.url, separator, encoded)
    }
}
