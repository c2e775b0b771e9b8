use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};

use crate::app::AppState;
use crate::auth::AuthContext;
use crate::errors::AppResult;
use crate::models::api_key::{
    ApiKey, ApiKeyVerification, CreateApiKeyRequest, CreatedApiKey, UpdateApiKeyRequest, VerifyApiKeyRequest,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_api_keys).post(create_api_key))
        .route("/verify", post(verify_api_key))
        .route("/:key_id", patch(update_api_key).delete(delete_api_key))
}

#[utoipa::path(
    get,
    path = "/api/api-keys",
    tag = "API Keys",
    responses((status = 200, description = "Keys of the caller", body = Vec<ApiKey>)),
    security(("bearerAuth" = []))
)]
pub async fn list_api_keys(State(state): State<AppState>, ctx: AuthContext) -> AppResult<Json<Vec<ApiKey>>> {
    Ok(Json(state.api_keys.list(&ctx).await?))
}

/// The secret `key` is only present in this response.
#[utoipa::path(
    post,
    path = "/api/api-keys",
    tag = "API Keys",
    request_body = CreateApiKeyRequest,
    responses((status = 201, description = "Key created", body = CreatedApiKey)),
    security(("bearerAuth" = []))
)]
pub async fn create_api_key(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<CreateApiKeyRequest>,
) -> AppResult<(StatusCode, Json<CreatedApiKey>)> {
    let created = state.api_keys.create(&ctx, &payload).await?;
    tracing::info!(key_id = %created.api_key.id, owner = %created.api_key.user_id, "api key created");
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    patch,
    path = "/api/api-keys/{key_id}",
    tag = "API Keys",
    params(("key_id" = String, Path, description = "Key id")),
    request_body = UpdateApiKeyRequest,
    responses((status = 200, description = "Updated key", body = ApiKey)),
    security(("bearerAuth" = []))
)]
pub async fn update_api_key(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(key_id): Path<String>,
    Json(payload): Json<UpdateApiKeyRequest>,
) -> AppResult<Json<ApiKey>> {
    Ok(Json(state.api_keys.update(&ctx, &key_id, &payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/api-keys/{key_id}",
    tag = "API Keys",
    params(("key_id" = String, Path, description = "Key id")),
    responses((status = 204, description = "Key deleted")),
    security(("bearerAuth" = []))
)]
pub async fn delete_api_key(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(key_id): Path<String>,
) -> AppResult<StatusCode> {
    state.api_keys.delete(&ctx, &key_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/api-keys/verify",
    tag = "API Keys",
    request_body = VerifyApiKeyRequest,
    responses((status = 200, description = "Verification result; invalid keys are not an error", body = ApiKeyVerification))
)]
pub async fn verify_api_key(
    State(state): State<AppState>,
    Json(payload): Json<VerifyApiKeyRequest>,
) -> AppResult<Json<ApiKeyVerification>> {
    Ok(Json(state.api_keys.verify(&payload.key, payload.permissions.as_ref()).await?))
}
