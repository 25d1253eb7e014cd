// Network backend built on reqwest.
// Resolves request URLs, performs the call, and converts non-2xx statuses to errors.

use futures::{StreamExt, future, stream};
use reqwest::{
    Client, Response, StatusCode, Url,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};
use serde_json::Value;
use tracing::debug;
use url::ParseError;

use crate::config::Config;
use crate::error::{Error, Result};

use super::handler::{EventStream, Handler};
use super::request::HttpRequest;
use super::response::{HttpEvent, HttpResponse};

/// Handler that performs real network I/O.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Option<Url>,
}

impl HttpClient {
    /// Create a client from the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();

        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| Error::Config(format!("invalid user_agent: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(Error::Api)?;

        let base_url = config
            .base_url
            .as_deref()
            .map(|base| Url::parse(base).map_err(|e| Error::InvalidUrl(format!("{}: {}", base, e))))
            .transpose()?;

        Ok(Self { client, base_url })
    }

    /// Resolve an absolute URL or a path against the base URL.
    pub fn resolve(&self, url: &str) -> Result<Url> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base
                    .join(url)
                    .map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e))),
                None => Err(Error::InvalidUrl(format!(
                    "{}: relative URL and no base_url configured",
                    url
                ))),
            },
            Err(e) => Err(Error::InvalidUrl(format!("{}: {}", url, e))),
        }
    }

    /// Build the reqwest request for a descriptor.
    fn build(&self, request: HttpRequest) -> Result<reqwest::Request> {
        let url = self.resolve(&request.url)?;

        let mut builder = self
            .client
            .request(request.method, url)
            .headers(request.headers);

        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder.build().map_err(Error::Api)
    }
}

impl Handler for HttpClient {
    fn handle(&self, request: HttpRequest) -> EventStream {
        let request = match self.build(request) {
            Ok(request) => request,
            Err(e) => return Box::pin(stream::once(future::ready(Err::<HttpEvent, _>(e)))),
        };

        debug!(method = %request.method(), url = %request.url(), "dispatching request");

        let client = self.client.clone();
        let fetch = async move {
            let response = client.execute(request).await.map_err(Error::Api)?;
            let response = check_response(response).await?;
            Ok::<_, Error>(HttpEvent::Response(into_http_response(response).await?))
        };

        let sent: Result<HttpEvent> = Ok(HttpEvent::Sent);
        Box::pin(stream::once(future::ready(sent)).chain(stream::once(fetch)))
    }
}

/// Check response status and convert errors.
async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, url, body))
}

fn status_error(status: StatusCode, url: String, body: String) -> Error {
    match status {
        StatusCode::UNAUTHORIZED => Error::Unauthorized,
        StatusCode::NOT_FOUND => Error::NotFound(url),
        status => Error::Status { status, body },
    }
}

async fn into_http_response(response: Response) -> Result<HttpResponse> {
    let status = response.status();
    let headers = response.headers().clone();
    let url = response.url().to_string();
    let bytes = response.bytes().await.map_err(Error::Api)?;

    Ok(HttpResponse {
        status,
        headers,
        body: parse_body(&bytes),
        url: Some(url),
    })
}

/// Parse a response body as JSON, falling back to a string.
fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }

    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheInterceptor;
    use crate::http::send;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn config_with_base(base: &str) -> Config {
        Config {
            base_url: Some(base.to_string()),
            ..Config::default()
        }
    }

    /// Serve a fixed HTTP response to every connection and count connections.
    async fn serve_fixed(status_line: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);

                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;

                let reply = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), hits)
    }

    #[test]
    fn test_resolve() {
        let client = HttpClient::new(&config_with_base("https://api.example.com/v1/")).unwrap();

        assert_eq!(
            client.resolve("cars?mark=Toyota").unwrap().as_str(),
            "https://api.example.com/v1/cars?mark=Toyota"
        );
        assert_eq!(
            client.resolve("/cars").unwrap().as_str(),
            "https://api.example.com/cars"
        );
        assert_eq!(
            client.resolve("http://other.example.com/x").unwrap().as_str(),
            "http://other.example.com/x"
        );
    }

    #[test]
    fn test_resolve_relative_without_base() {
        let client = HttpClient::new(&Config::default()).unwrap();
        assert!(matches!(client.resolve("/cars"), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpClient::new(&config_with_base("not a url")).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, String::new(), String::new()),
            Error::Unauthorized
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "http://x/cars".into(), String::new()),
            Error::NotFound(url) if url == "http://x/cars"
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, String::new(), "upstream".into()),
            Error::Status { status, body } if status == StatusCode::BAD_GATEWAY && body == "upstream"
        ));
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(b""), Value::Null);
        assert_eq!(parse_body(b"  \n"), Value::Null);
        assert_eq!(parse_body(br#"{"id":1}"#), json!({"id": 1}));
        assert_eq!(parse_body(b"plain text"), json!("plain text"));
    }

    #[tokio::test]
    async fn test_relative_url_error_is_streamed() {
        let client = HttpClient::new(&Config::default()).unwrap();
        let err = send(&client, HttpRequest::get("/cars")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_fetch_json() {
        let (base, hits) = serve_fixed("200 OK", r#"{"id":1,"name":"Toyota"}"#).await;
        let client = HttpClient::new(&config_with_base(&base)).unwrap();

        let events: Vec<_> = client
            .handle(HttpRequest::get("/cars").with_param("mark", "Toyota"))
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Ok(HttpEvent::Sent)));
        let resp = events[1].as_ref().unwrap().as_response().unwrap();
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body, json!({"id": 1, "name": "Toyota"}));
        assert!(resp.url.as_deref().unwrap().ends_with("/cars?mark=Toyota"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let (base, _hits) = serve_fixed("404 Not Found", "").await;
        let client = HttpClient::new(&config_with_base(&base)).unwrap();

        let err = send(&client, HttpRequest::get("/cars/99")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(url) if url.ends_with("/cars/99")));
    }

    #[tokio::test]
    async fn test_cached_client_hits_network_once() {
        let (base, hits) = serve_fixed("200 OK", r#"[{"id":1,"name":"Toyota"}]"#).await;
        let client = HttpClient::new(&config_with_base(&base)).unwrap();
        let cache = CacheInterceptor::new(client);

        let first = send(&cache, HttpRequest::get("/cars?mark=Toyota")).await.unwrap();
        let second = send(&cache, HttpRequest::get("/cars?mark=Toyota")).await.unwrap();

        assert_eq!(first.body, second.body);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_not_cached() {
        let (base, hits) = serve_fixed("500 Internal Server Error", "boom").await;
        let client = HttpClient::new(&config_with_base(&base)).unwrap();
        let cache = CacheInterceptor::new(client);

        for _ in 0..2 {
            let err = send(&cache, HttpRequest::get("/cars")).await.unwrap_err();
            assert!(matches!(err, Error::Status { .. }));
        }
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(cache.store().is_empty());
    }
}
