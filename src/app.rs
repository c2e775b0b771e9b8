use std::sync::Arc;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{
    AdminService, ApiKeyService, AuthBackend, EmailPasswordService, HttpAuthBackend, OrganizationService,
    SessionService,
};
use crate::authz::{DefaultPermissionEvaluator, InMemoryRoleRepository, PermissionEvaluator, RoleRepository};
use crate::config::AppConfig;
use crate::events::{init_event_bus, EventBus};
use crate::routes::{api_keys, auth, health, jobs, organizations, proxy, rbac, users};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: Option<PgPool>,
    pub roles: Arc<dyn RoleRepository>,
    pub evaluator: Arc<dyn PermissionEvaluator>,
    pub sessions: SessionService,
    pub admin: AdminService,
    pub organizations: OrganizationService,
    pub api_keys: ApiKeyService,
    pub accounts: EmailPasswordService,
    /// Client for the backend REST API (proxy route and job calls).
    pub upstream: reqwest::Client,
    pub event_bus: EventBus,
}

impl AppState {
    /// Wires every facade to `backend` with the default role table.
    pub fn with_backend<B>(config: AppConfig, pool: Option<PgPool>, backend: Arc<B>) -> Self
    where
        B: AuthBackend + 'static,
    {
        let roles: Arc<dyn RoleRepository> = Arc::new(InMemoryRoleRepository::with_defaults());
        Self::with_parts(config, pool, backend, roles)
    }

    pub fn with_parts<B>(config: AppConfig, pool: Option<PgPool>, backend: Arc<B>, roles: Arc<dyn RoleRepository>) -> Self
    where
        B: AuthBackend + 'static,
    {
        let evaluator: Arc<dyn PermissionEvaluator> = Arc::new(DefaultPermissionEvaluator::new(roles.clone()));
        let (event_bus, _) = init_event_bus();

        Self {
            config: Arc::new(config),
            pool,
            roles,
            sessions: SessionService::new(backend.clone()),
            admin: AdminService::new(backend.clone(), evaluator.clone()),
            organizations: OrganizationService::new(backend.clone(), evaluator.clone()),
            api_keys: ApiKeyService::new(backend.clone(), evaluator.clone()),
            accounts: EmailPasswordService::new(backend),
            evaluator,
            upstream: reqwest::Client::new(),
            event_bus,
        }
    }

    /// Production wiring: the auth service over HTTP.
    pub fn from_config(config: AppConfig, pool: Option<PgPool>) -> Self {
        let backend = Arc::new(HttpAuthBackend::new(&config.auth_url));
        Self::with_backend(config, pool, backend)
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_origin(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/health", get(health::health))
        .nest("/auth", auth::routes())
        .nest("/admin/users", users::routes())
        .nest("/rbac", rbac::routes())
        .nest("/organizations", organizations::routes())
        .nest("/api-keys", api_keys::routes())
        .nest("/jobs", jobs::routes())
        .nest("/proxy", proxy::routes());

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
