//! Same-origin passthrough to the Tambo AI service
//!
//! The browser talks to `/api/tambo/...`; this module rebuilds the request
//! against the configured upstream, injects the server-held bearer token and
//! relays the answer. Event streams are piped through chunk by chunk, every
//! other response is re-emitted as JSON with the upstream status.

use axum::body::{Body, Bytes};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::{Config, ConnectionMode};

/// Browser-side mount point of the passthrough
pub const PROXY_MOUNT: &str = "/api/tambo";

/// Inbound headers copied to the upstream request
fn forwarded_headers() -> [HeaderName; 2] {
    [header::ACCEPT, header::CONTENT_TYPE]
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("TAMBO_API_KEY is not configured")]
    NotConfigured,

    #[error("Upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream returned a non-JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let message = match self {
            ProxyError::NotConfigured => self.to_string(),
            _ => {
                tracing::error!("Tambo proxy error: {}", self);
                "Failed to proxy request to Tambo".to_string()
            }
        };

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": message })),
        )
            .into_response()
    }
}

/// An inbound request, already split by the router
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    /// Path below the mount point, without a leading slash
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Answer of `GET /api/tambo-status`
#[derive(Debug, Clone, Serialize)]
pub struct ProxyStatus {
    pub configured: bool,
}

/// How the browser should reach the AI service
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ConnectionInfo {
    Proxy { url: String },
    Direct { url: String, api_key: String },
}

impl ConnectionInfo {
    /// Direct mode needs both public variables; anything else goes through the proxy
    pub fn from_config(config: &Config) -> Self {
        if config.connection_mode == ConnectionMode::Direct {
            match (&config.public_tambo_url, &config.public_tambo_api_key) {
                (Some(url), Some(api_key)) => {
                    return ConnectionInfo::Direct {
                        url: url.clone(),
                        api_key: api_key.clone(),
                    };
                }
                _ => tracing::warn!(
                    "direct connection requested without PUBLIC_TAMBO_URL/PUBLIC_TAMBO_API_KEY, using proxy"
                ),
            }
        }

        ConnectionInfo::Proxy {
            url: PROXY_MOUNT.to_string(),
        }
    }
}

pub struct TamboProxy {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl TamboProxy {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            // no overall timeout: event streams stay open for the whole reply
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tambo_url.clone(), config.tambo_api_key.clone())
    }

    pub fn status(&self) -> ProxyStatus {
        ProxyStatus {
            configured: self.api_key.is_some(),
        }
    }

    pub fn target_url(&self, path: &str, query: Option<&str>) -> String {
        let path = path.trim_start_matches('/');
        match query.filter(|q| !q.is_empty()) {
            Some(query) => format!("{}/{}?{}", self.base_url, path, query),
            None => format!("{}/{}", self.base_url, path),
        }
    }

    /// Relay one request upstream.
    ///
    /// Fails with [`ProxyError::NotConfigured`] before touching the network
    /// when no credential is set.
    pub async fn forward(&self, request: ProxyRequest) -> Result<Response, ProxyError> {
        let api_key = self.api_key.as_deref().ok_or(ProxyError::NotConfigured)?;
        let url = self.target_url(&request.path, request.query.as_deref());

        tracing::debug!("proxy {} {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .bearer_auth(api_key);

        for name in forwarded_headers() {
            if let Some(value) = request.headers.get(&name) {
                builder = builder.header(name, value.clone());
            }
        }

        if !request.body.is_empty() {
            if !request.headers.contains_key(header::CONTENT_TYPE) {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
            }
            builder = builder.body(request.body);
        }

        let upstream = builder.send().await?;
        let status = upstream.status();

        if is_event_stream(upstream.headers()) {
            return Ok(relay_event_stream(status, upstream));
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(StatusCode::NO_CONTENT.into_response());
        }

        let body = upstream.bytes().await?;
        let data: Value = serde_json::from_slice(&body)?;
        Ok((status, Json(data)).into_response())
    }
}

fn is_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/event-stream"))
        .unwrap_or(false)
}

/// Pipe an upstream event stream to the caller.
///
/// The upstream body is owned by the returned response; when the caller
/// disconnects the body is dropped and the upstream connection with it.
fn relay_event_stream(status: StatusCode, upstream: reqwest::Response) -> Response {
    let mut chunks = upstream.bytes_stream().boxed();

    let relay = async_stream::stream! {
        let mut relayed = 0usize;
        while let Some(chunk) = chunks.next().await {
            match &chunk {
                Ok(bytes) => relayed += bytes.len(),
                Err(e) => tracing::warn!("event stream interrupted: {}", e),
            }
            yield chunk;
        }
        tracing::debug!(relayed, "event stream finished");
    };

    let mut response = Response::new(Body::from_stream(relay));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

    response
}
