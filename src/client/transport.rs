//! Transport adapter
//!
//! Performs exactly one HTTP round trip per call against a fixed base URL.
//! Network failures and non-2xx statuses both surface as
//! [`Error::Transport`](crate::Error::Transport); retries never happen here.

use crate::{Error, Result, config::Settings};
use reqwest::{Client, Method, Proxy, header::CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;

/// Body of a raw response
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Body declared as JSON and parsed successfully
    Json(Value),
    /// Any other non-empty body
    Text(String),
    /// No body
    Empty,
}

impl ResponseBody {
    /// Parsed JSON body, if the response carried one
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Status plus body of a single response
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: ResponseBody,
}

impl RawResponse {
    /// Create a response with a JSON body
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: ResponseBody::Json(body),
        }
    }

    /// Create a response with a non-JSON body
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            status,
            body: if body.is_empty() {
                ResponseBody::Empty
            } else {
                ResponseBody::Text(body)
            },
        }
    }

    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into a transport error
    ///
    /// The remote's `message` field is preferred; otherwise the message
    /// names the numeric status.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        let message = self
            .body
            .as_json()
            .and_then(|body| body.get("message"))
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed with status {}", self.status));

        Err(Error::http_status(self.status, message))
    }
}

/// A single request handed to a [`Transport`]
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the base URL, starting with `/`
    pub path: String,
    /// Request headers
    pub headers: Vec<(String, String)>,
    /// JSON body
    pub body: Option<Value>,
}

impl TransportRequest {
    /// Create a GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Create a POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            ..Self::get(path)
        }
    }

    /// Add header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Set request body
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a header value (case-insensitive)
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Performs one request against the remote
///
/// Implementations return `Ok` only for 2xx responses.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return its raw response
    async fn send(&self, request: TransportRequest) -> Result<RawResponse>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Base HTTP client
    client: Client,
    /// Origin that request paths are joined onto
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for `base_url` with default HTTP options
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::from_settings(&Settings {
            api: crate::config::ApiSettings {
                base_url: base_url.into(),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    /// Create a transport using the API and network sections of `settings`
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.api.base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url).map_err(|e| {
            Error::config("base_url", &format!("Invalid base URL '{}': {}", base_url, e))
        })?;

        let mut client_builder = Client::builder()
            .user_agent(settings.api.user_agent.clone())
            .connect_timeout(Duration::from_secs(settings.network.connect_timeout));

        if settings.api.request_timeout > 0 {
            client_builder =
                client_builder.timeout(Duration::from_secs(settings.api.request_timeout));
        }

        if let Some(proxy_url) = settings.get_proxy_url() {
            let proxy = Proxy::all(&proxy_url).map_err(|e| {
                Error::config("proxy", &format!("Invalid proxy URL '{}': {}", proxy_url, e))
            })?;
            client_builder = client_builder.proxy(proxy);
        } else {
            // proxy env vars are already folded into settings
            client_builder = client_builder.no_proxy();
        }

        let client = client_builder.build().map_err(|e| {
            Error::config("client", &format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self { client, base_url })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_body(response: reqwest::Response) -> Result<ResponseBody> {
        let declares_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().contains("json"));

        let text = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("Failed to read response body: {}", e)))?;

        if text.trim().is_empty() {
            return Ok(ResponseBody::Empty);
        }

        if declares_json {
            match serde_json::from_str(&text) {
                Ok(value) => return Ok(ResponseBody::Json(value)),
                Err(e) => tracing::debug!("Response declared JSON but did not parse: {}", e),
            }
        }

        Ok(ResponseBody::Text(text))
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        tracing::debug!("{} {}", request.method, url);

        let mut builder = self.client.request(request.method.clone(), &url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!("Request to {} failed: {}", request.path, e);
            Error::transport(format!("Network request failed: {}", e))
        })?;

        let status = response.status().as_u16();
        let body = Self::read_body(response).await?;
        tracing::debug!("{} {} -> {}", request.method, request.path, status);

        RawResponse { status, body }.error_for_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_error_for_status_prefers_remote_message() {
        let raw = RawResponse::json(401, json!({"message": "bad key"}));
        let err = raw.error_for_status().unwrap_err();
        assert_eq!(err.to_string(), "bad key");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_error_for_status_synthesizes_message() {
        let err = RawResponse::text(502, "").error_for_status().unwrap_err();
        assert!(err.to_string().contains("502"));

        let err = RawResponse::json(500, json!({"error": "boom"}))
            .error_for_status()
            .unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status 500");
    }

    #[test]
    fn test_success_passes_through() {
        let raw = RawResponse::json(200, json!({"status": "success"}));
        assert_eq!(raw.clone().error_for_status().unwrap(), raw);
    }

    #[test]
    fn test_request_builder() {
        let request = TransportRequest::post("/bypass")
            .with_header("x-api-key", "key")
            .with_body(json!({"url": "https://example.com"}));

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.header("X-API-KEY"), Some("key"));
        assert!(request.body.is_some());
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpTransport::new("not a url").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let transport = HttpTransport::new("https://api.voltar.lol/").unwrap();
        assert_eq!(transport.base_url(), "https://api.voltar.lol");
    }

    #[tokio::test]
    async fn test_send_json_round_trip() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bypass"))
            .and(header("x-api-key", "key"))
            .and(body_json(json!({"url": "https://example.com", "cache": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "success", "result": "https://dest"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::new(mock_server.uri()).unwrap();
        let raw = transport
            .send(
                TransportRequest::post("/bypass")
                    .with_header("x-api-key", "key")
                    .with_body(json!({"url": "https://example.com", "cache": true})),
            )
            .await
            .unwrap();

        assert_eq!(raw.status, 200);
        assert_eq!(
            raw.body.as_json().unwrap()["result"],
            json!("https://dest")
        );
    }

    #[tokio::test]
    async fn test_send_non_json_body_kept_as_text() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/bypass/services"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::new(mock_server.uri()).unwrap();
        let raw = transport
            .send(TransportRequest::get("/bypass/services"))
            .await
            .unwrap();

        assert_eq!(raw.body, ResponseBody::Text("<html>ok</html>".to_string()));
    }

    #[tokio::test]
    async fn test_send_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/bypass/services"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "bad key"})))
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::new(mock_server.uri()).unwrap();
        let err = transport
            .send(TransportRequest::get("/bypass/services"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("bad key"));
        assert_eq!(err.status(), Some(403));
    }

    #[tokio::test]
    async fn test_send_network_error() {
        let transport = HttpTransport::new("http://127.0.0.1:1").unwrap();
        let err = transport
            .send(TransportRequest::get("/bypass/services"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport { status: None, .. }));
    }
}
