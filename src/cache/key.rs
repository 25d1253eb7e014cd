// Request key derivation.
// Two read requests with the same URL and query string share a key.

use std::fmt;

use crate::http::HttpRequest;

/// Cache identity of a read request: the full URL including query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey(String);

impl RequestKey {
    /// Derive the key for a request. Headers, body, and method are ignored.
    pub fn from_request(request: &HttpRequest) -> Self {
        Self(request.url_with_params())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RequestKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for RequestKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
