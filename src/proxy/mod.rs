//! Client for the backend REST API, reached through the same-origin proxy path.
//!
//! Every non-2xx answer becomes a [`ProxyError::Status`]; callers never see an
//! envelope with an error inside it.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::auth::RequestHeaders;

pub const PROXY_PREFIX: &str = "/api/proxy";

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Non-2xx status; `message` is the best human-readable text found.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("empty response body from {0}")]
    Empty(String),
}

impl ProxyError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ProxyError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Message for an error response with no usable body text.
fn default_error_message(status: u16, status_text: &str) -> String {
    match status {
        401 => "Authentication failed".to_string(),
        403 => "Token expired".to_string(),
        _ if status_text.is_empty() => format!("Request failed with status {status}"),
        _ => format!("Request failed with status {status} {status_text}"),
    }
}

fn message_field(map: &serde_json::Map<String, Value>) -> Option<String> {
    ["detail", "error", "message"].iter().find_map(|field| match map.get(*field)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        // `{"error": {"message": "..."}}`
        Value::Object(inner) => message_field(inner),
        _ => None,
    })
}

/// Best-effort error text: JSON `detail`/`error`/`message`, else raw body, else status defaults.
pub fn error_message(status: u16, status_text: &str, body: &str) -> String {
    if body.trim().is_empty() {
        return default_error_message(status, status_text);
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => message_field(&map).unwrap_or_else(|| body.to_string()),
        _ => body.to_string(),
    }
}

/// Applies the response contract to an already-read body.
///
/// 204 and empty bodies are `None`; other 2xx bodies must be JSON.
pub fn interpret_response(status: u16, status_text: &str, body: &str) -> Result<Option<Value>, ProxyError> {
    if !(200..300).contains(&status) {
        return Err(ProxyError::Status {
            status,
            message: error_message(status, status_text, body),
        });
    }

    if status == StatusCode::NO_CONTENT.as_u16() || body.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(body)
        .map(Some)
        .map_err(|err| ProxyError::Decode(err.to_string()))
}

/// Reads the body once as text and interprets it.
pub async fn read_response(resp: reqwest::Response) -> Result<Option<Value>, ProxyError> {
    let status = resp.status();
    if status == StatusCode::NO_CONTENT {
        return Ok(None);
    }

    let status_text = status.canonical_reason().unwrap_or_default();
    let body = resp.text().await?;
    interpret_response(status.as_u16(), status_text, &body)
}

/// Typed decoding that reports the failing field path.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ProxyError> {
    serde_path_to_error::deserialize(value)
        .map_err(|err| ProxyError::Decode(format!("{} at `{}`", err.inner(), err.path())))
}

#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    base_url: String,
    prefix: &'static str,
    headers: RequestHeaders,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            prefix: PROXY_PREFIX,
            headers: RequestHeaders::new(),
        }
    }

    /// Talks to the backend API itself instead of the console's proxy path.
    pub fn direct(mut self) -> Self {
        self.prefix = "";
        self
    }

    /// Credentials (cookie, authorization) sent with every request.
    pub fn with_headers(mut self, headers: RequestHeaders) -> Self {
        self.headers = headers;
        self
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            self.prefix,
            endpoint.trim_start_matches('/')
        )
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Option<T>, ProxyError> {
        let url = self.endpoint_url(endpoint);
        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        for (name, value) in self.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = body {
            builder = builder.body(body.to_string());
        }

        tracing::debug!(%method, %url, "proxy request");
        let resp = builder.send().await?;
        match read_response(resp).await? {
            Some(value) => decode(value).map(Some),
            None => Ok(None),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Option<T>, ProxyError> {
        self.request(Method::GET, endpoint, None).await
    }

    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<Option<T>, ProxyError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, endpoint, Some(to_body(body)?)).await
    }

    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> Result<Option<T>, ProxyError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, endpoint, Some(to_body(body)?)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Option<T>, ProxyError> {
        self.request(Method::DELETE, endpoint, None).await
    }
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<Value, ProxyError> {
    serde_json::to_value(body).map_err(|err| ProxyError::Decode(err.to_string()))
}
