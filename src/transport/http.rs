use std::env;
use std::time::Duration;

use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Proxy;

use super::TransportError;
use crate::client::config::{AuthHeader, CompletionConfig};
use crate::{BoxStream, Error, ErrorContext, Result};

/// Header carrying the key when [`AuthHeader::ApiKey`] is selected.
pub const API_KEY_HEADER: &str = "api-key";

/// Correlation id sent with every completion request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub struct HttpTransport {
    client: reqwest::Client,
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|s| s.parse::<u64>().ok())
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        // The total timeout bounds the whole streamed body, not just the
        // headers; raise AI_HTTP_TIMEOUT_SECS for long generations.
        let timeout_secs = env_u64("AI_HTTP_TIMEOUT_SECS").unwrap_or(120);
        let connect_timeout_secs = env_u64("AI_HTTP_CONNECT_TIMEOUT_SECS").unwrap_or(10);

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .pool_max_idle_per_host(
                env_u64("AI_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .map(|n| n as usize)
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Ok(proxy_url) = env::var("AI_PROXY_URL") {
            match Proxy::all(&proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => tracing::warn!(error = %e, "ignoring invalid AI_PROXY_URL"),
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self { client })
    }

    /// Wrap an existing client (shared connection pool, custom TLS, ...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build the request headers for `config`.
    ///
    /// Order matters: content type, then auth, then the caller's headers, so
    /// custom headers can replace auth for non-standard gateways.
    pub fn build_headers(config: &CompletionConfig, request_id: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        headers.insert(
            HeaderName::from_static(REQUEST_ID_HEADER),
            header_value(REQUEST_ID_HEADER, request_id)?,
        );

        if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            match config.auth_header {
                AuthHeader::Bearer => {
                    headers.insert(AUTHORIZATION, header_value("authorization", &format!("Bearer {key}"))?);
                }
                AuthHeader::ApiKey => {
                    headers.insert(HeaderName::from_static(API_KEY_HEADER), header_value(API_KEY_HEADER, key)?);
                }
            }
        }

        for (name, value) in &config.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid header name '{name}'"),
                    ErrorContext::new()
                        .with_field_path(format!("config.headers.{name}"))
                        .with_details(e.to_string())
                        .with_source("http_transport"),
                )
            })?;
            headers.insert(header_name, header_value(name, value)?);
        }

        Ok(headers)
    }

    /// POST `body` to `endpoint` and return the raw response, whatever its status.
    pub async fn post_stream_response(
        &self,
        endpoint: &str,
        headers: HeaderMap,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response> {
        self.client
            .post(endpoint)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))
    }

    /// Convert a response body into the crate's byte stream.
    pub fn body_stream(resp: reqwest::Response) -> BoxStream<'static, Bytes> {
        let byte_stream = resp
            .bytes_stream()
            .map_err(|e| Error::Transport(TransportError::Http(e)));
        Box::pin(byte_stream)
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid value for header '{name}'"),
            ErrorContext::new()
                .with_details(e.to_string())
                .with_source("http_transport"),
        )
    })
}

/// Best-effort extraction of a server error message from a response body.
///
/// Understands `{"error": {"message": ...}}`, `{"error": "..."}` and
/// `{"message": ...}`; anything else yields the generic status message.
pub fn error_message_from_body(status: u16, body: &str) -> String {
    let fallback = || format!("API request failed: {status}");
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback();
    };

    let message = json
        .get("error")
        .and_then(|e| e.get("message").and_then(|m| m.as_str()).or_else(|| e.as_str()))
        .or_else(|| json.get("message").and_then(|m| m.as_str()))
        .map(str::trim)
        .filter(|m| !m.is_empty());

    match message {
        Some(m) => m.to_string(),
        None => fallback(),
    }
}
