use std::sync::Arc;

use serde_json::json;

use super::backend::ApiKeyBackend;
use super::instrument::instrument;
use super::AuthContext;
use crate::authz::{ensure_permitted, Action, PermissionEvaluator, Resource, Scopes};
use crate::errors::AppResult;
use crate::models::api_key::{
    ApiKey, ApiKeyVerification, CreateApiKeyRequest, CreatedApiKey, UpdateApiKeyRequest,
};

#[derive(Clone)]
pub struct ApiKeyService {
    backend: Arc<dyn ApiKeyBackend>,
    evaluator: Arc<dyn PermissionEvaluator>,
}

impl ApiKeyService {
    pub fn new(backend: Arc<dyn ApiKeyBackend>, evaluator: Arc<dyn PermissionEvaluator>) -> Self {
        Self { backend, evaluator }
    }

    async fn guard(&self, ctx: &AuthContext, action: Action) -> AppResult<()> {
        ensure_permitted(self.evaluator.as_ref(), &ctx.subject, Resource::ApiKey, action).await
    }

    pub async fn create(&self, ctx: &AuthContext, req: &CreateApiKeyRequest) -> AppResult<CreatedApiKey> {
        self.guard(ctx, Action::Create).await?;
        instrument("apiKey.create", json!(req), self.backend.create_api_key(&ctx.headers, req)).await
    }

    pub async fn list(&self, ctx: &AuthContext) -> AppResult<Vec<ApiKey>> {
        self.guard(ctx, Action::List).await?;
        instrument("apiKey.list", json!({}), self.backend.list_api_keys(&ctx.headers)).await
    }

    pub async fn update(&self, ctx: &AuthContext, key_id: &str, req: &UpdateApiKeyRequest) -> AppResult<ApiKey> {
        self.guard(ctx, Action::Update).await?;
        instrument(
            "apiKey.update",
            json!({ "keyId": key_id, "data": req }),
            self.backend.update_api_key(&ctx.headers, key_id, req),
        )
        .await
    }

    pub async fn delete(&self, ctx: &AuthContext, key_id: &str) -> AppResult<()> {
        self.guard(ctx, Action::Delete).await?;
        instrument(
            "apiKey.delete",
            json!({ "keyId": key_id }),
            self.backend.delete_api_key(&ctx.headers, key_id),
        )
        .await
    }

    /// Unguarded: this is how a machine caller proves who it is.
    pub async fn verify(&self, key: &str, permissions: Option<&Scopes>) -> AppResult<ApiKeyVerification> {
        instrument(
            "apiKey.verify",
            json!({ "key": key, "permissions": permissions }),
            self.backend.verify_api_key(key, permissions),
        )
        .await
    }
}
