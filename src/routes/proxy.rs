//! Same-origin pass-through to the backend REST API.
//!
//! The caller's bearer token (or the token of their session) is attached;
//! status and body of the backend answer are relayed unchanged.

use axum::{
    body::{Body, Bytes},
    extract::{Path, RawQuery, State},
    http::{header, Method, StatusCode},
    response::Response,
    routing::any,
    Router,
};

use crate::app::AppState;
use crate::auth::AuthContext;
use crate::errors::{AppError, AppResult};

pub fn routes() -> Router<AppState> {
    Router::new().route("/*endpoint", any(forward))
}

/// Backend URL for `endpoint` (and the raw query string, if any).
pub fn upstream_url(api_url: &str, endpoint: &str, query: Option<&str>) -> String {
    let mut url = format!("{}/{}", api_url.trim_end_matches('/'), endpoint.trim_start_matches('/'));
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    url
}

#[utoipa::path(
    get,
    path = "/api/proxy/{endpoint}",
    tag = "Proxy",
    params(("endpoint" = String, Path, description = "Backend path, any method is forwarded")),
    responses(
        (status = 200, description = "Backend response, relayed as-is"),
        (status = 401, description = "No bearer token or session"),
        (status = 502, description = "Backend unreachable")
    ),
    security(("bearerAuth" = []))
)]
pub async fn forward(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(endpoint): Path<String>,
    method: Method,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> AppResult<Response> {
    let token = ctx
        .backend_token()
        .ok_or_else(|| AppError::unauthorized("UNAUTHORIZED"))?;

    let url = upstream_url(&state.config.api_url, &endpoint, query.as_deref());
    let upstream_method = reqwest::Method::from_bytes(method.as_str().as_bytes())
        .map_err(|_| AppError::bad_request(format!("unsupported method {method}")))?;

    tracing::debug!(%method, %url, "proxying request");
    let mut request = state
        .upstream
        .request(upstream_method, &url)
        .header(reqwest::header::AUTHORIZATION, format!("Bearer {token}"))
        .header(reqwest::header::ACCEPT, "application/json");
    if !body.is_empty() {
        request = request
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_vec());
    }

    let resp = request.send().await.map_err(|err| {
        tracing::warn!(error = %err, %url, "backend unreachable");
        AppError::upstream(502, format!("backend unreachable: {err}"))
    })?;

    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/json")
        .to_string();
    let bytes = resp
        .bytes()
        .await
        .map_err(|err| AppError::upstream(502, format!("failed to read backend response: {err}")))?;

    if !status.is_success() {
        tracing::info!(status = status.as_u16(), %url, "backend returned an error");
    }

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes.to_vec()))
        .map_err(|err| AppError::internal(err.to_string()))
}
