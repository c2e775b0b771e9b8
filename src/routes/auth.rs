use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::app::AppState;
use crate::auth::RequestHeaders;
use crate::errors::{AppError, AppResult};
use crate::models::session::{RevokeSessionRequest, Session, SessionWithUser};
use crate::models::user::{AuthResponse, ChangePasswordRequest, MessageResponse, SignInRequest, SignUpRequest};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", post(sign_in))
        .route("/sign-out", post(sign_out))
        .route("/change-password", post(change_password))
        .route("/session", get(current_session))
        .route("/sessions", get(list_sessions))
        .route("/sessions/revoke", post(revoke_session))
        .route("/sessions/revoke-others", post(revoke_other_sessions))
}

#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    tag = "Auth",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Password too short")
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SignUpRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let headers = RequestHeaders::from_headers(&headers);
    let resp = state.accounts.sign_up(&headers, &payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/sign-in",
    tag = "Auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SignInRequest>,
) -> AppResult<Json<AuthResponse>> {
    let headers = RequestHeaders::from_headers(&headers);
    Ok(Json(state.accounts.sign_in(&headers, &payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/auth/sign-out",
    tag = "Auth",
    responses((status = 200, description = "Signed out", body = MessageResponse))
)]
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<MessageResponse>> {
    let headers = RequestHeaders::from_headers(&headers);
    state.accounts.sign_out(&headers).await?;
    Ok(Json(MessageResponse {
        message: "signed out".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    tag = "Auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Password too short")
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let headers = RequestHeaders::from_headers(&headers);
    state.accounts.change_password(&headers, &payload).await?;
    Ok(Json(MessageResponse {
        message: "password changed".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    tag = "Auth",
    responses(
        (status = 200, description = "Current session and user", body = SessionWithUser),
        (status = 401, description = "No session")
    )
)]
pub async fn current_session(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<SessionWithUser>> {
    let headers = RequestHeaders::from_headers(&headers);
    state
        .sessions
        .get_session(&headers)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::unauthorized("no active session"))
}

#[utoipa::path(
    get,
    path = "/api/auth/sessions",
    tag = "Auth",
    responses((status = 200, description = "Sessions of the current user", body = Vec<Session>))
)]
pub async fn list_sessions(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<Vec<Session>>> {
    let headers = RequestHeaders::from_headers(&headers);
    Ok(Json(state.sessions.list_sessions(&headers).await?))
}

#[utoipa::path(
    post,
    path = "/api/auth/sessions/revoke",
    tag = "Auth",
    request_body = RevokeSessionRequest,
    responses((status = 204, description = "Session revoked"))
)]
pub async fn revoke_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RevokeSessionRequest>,
) -> AppResult<StatusCode> {
    let headers = RequestHeaders::from_headers(&headers);
    state.sessions.revoke_session(&headers, &payload.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/auth/sessions/revoke-others",
    tag = "Auth",
    responses((status = 204, description = "Other sessions revoked"))
)]
pub async fn revoke_other_sessions(State(state): State<AppState>, headers: HeaderMap) -> AppResult<StatusCode> {
    let headers = RequestHeaders::from_headers(&headers);
    state.sessions.revoke_other_sessions(&headers).await?;
    Ok(StatusCode::NO_CONTENT)
}
