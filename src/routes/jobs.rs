//! Scheduler job endpoints, guarded by the `job` grants and forwarded to the backend API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::app::AppState;
use crate::auth::{AuthContext, RequestHeaders};
use crate::authz::{ensure_permitted, Action, Resource};
use crate::errors::AppResult;
use crate::jobs::{FieldErrors, JobForm, JobsClient};
use crate::models::job::{Job, JobHistory};
use crate::models::page::{Page, PageQuery};
use crate::proxy::ProxyClient;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_jobs).post(create_job))
        .route("/validate", post(validate_job))
        .route("/history", get(list_history))
        .route("/:id", get(get_job).delete(delete_job))
        .route("/:id/pause", post(pause_job))
        .route("/:id/resume", post(resume_job))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JobValidationResponse {
    pub errors: FieldErrors,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    pub job_id: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

fn jobs_client(state: &AppState, ctx: &AuthContext) -> JobsClient {
    let mut headers = RequestHeaders::new();
    if let Some(token) = ctx.backend_token() {
        headers = headers.with_bearer_token(token);
    }
    let proxy = ProxyClient::with_client(state.upstream.clone(), state.config.api_url.clone())
        .direct()
        .with_headers(headers);
    JobsClient::new(proxy)
}

async fn guard(state: &AppState, ctx: &AuthContext, action: Action) -> AppResult<()> {
    ensure_permitted(state.evaluator.as_ref(), &ctx.subject, Resource::Job, action).await
}

fn invalid(errors: FieldErrors) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(JobValidationResponse { errors })).into_response()
}

#[utoipa::path(
    get,
    path = "/api/jobs",
    tag = "Jobs",
    params(PageQuery),
    responses((status = 200, description = "Page of scheduled jobs", body = JobPage)),
    security(("bearerAuth" = []))
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Job>>> {
    guard(&state, &ctx, Action::List).await?;
    let page = jobs_client(&state, &ctx).list_jobs(query.page, query.page_size).await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/jobs/validate",
    tag = "Jobs",
    request_body = JobForm,
    responses(
        (status = 200, description = "Request the form would send", body = JobCreateRequest),
        (status = 422, description = "Field errors", body = JobValidationResponse)
    )
)]
pub async fn validate_job(Json(form): Json<JobForm>) -> Response {
    match form.validate() {
        Ok(req) => Json(req).into_response(),
        Err(errors) => invalid(errors),
    }
}

#[utoipa::path(
    post,
    path = "/api/jobs",
    tag = "Jobs",
    request_body = JobForm,
    responses(
        (status = 201, description = "Job scheduled", body = Job),
        (status = 422, description = "Field errors", body = JobValidationResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_job(State(state): State<AppState>, ctx: AuthContext, Json(form): Json<JobForm>) -> AppResult<Response> {
    guard(&state, &ctx, Action::Create).await?;
    let req = match form.validate() {
        Ok(req) => req,
        Err(errors) => return Ok(invalid(errors)),
    };

    let job = jobs_client(&state, &ctx).create_job(&req).await?;
    tracing::info!(job_id = %job.id, trigger = req.trigger_type.as_str(), "job created");
    Ok((StatusCode::CREATED, Json(job)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/jobs/history",
    tag = "Jobs",
    params(HistoryParams),
    responses((status = 200, description = "Job execution history", body = JobHistoryPage)),
    security(("bearerAuth" = []))
)]
pub async fn list_history(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(params): Query<HistoryParams>,
) -> AppResult<Json<Page<JobHistory>>> {
    guard(&state, &ctx, Action::Read).await?;
    let page = jobs_client(&state, &ctx)
        .list_history(
            params.job_id.as_deref(),
            params.page.unwrap_or(1),
            params.page_size.unwrap_or(20),
        )
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    tag = "Jobs",
    params(("id" = String, Path, description = "Job id")),
    responses((status = 200, description = "Job", body = Job)),
    security(("bearerAuth" = []))
)]
pub async fn get_job(State(state): State<AppState>, ctx: AuthContext, Path(id): Path<String>) -> AppResult<Json<Job>> {
    guard(&state, &ctx, Action::Read).await?;
    Ok(Json(jobs_client(&state, &ctx).get_job(&id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/jobs/{id}",
    tag = "Jobs",
    params(("id" = String, Path, description = "Job id")),
    responses((status = 204, description = "Job removed")),
    security(("bearerAuth" = []))
)]
pub async fn delete_job(State(state): State<AppState>, ctx: AuthContext, Path(id): Path<String>) -> AppResult<StatusCode> {
    guard(&state, &ctx, Action::Delete).await?;
    jobs_client(&state, &ctx).delete_job(&id).await?;
    tracing::info!(job_id = %id, "job deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/jobs/{id}/pause",
    tag = "Jobs",
    params(("id" = String, Path, description = "Job id")),
    responses((status = 200, description = "Paused job", body = Job)),
    security(("bearerAuth" = []))
)]
pub async fn pause_job(State(state): State<AppState>, ctx: AuthContext, Path(id): Path<String>) -> AppResult<Json<Job>> {
    guard(&state, &ctx, Action::Pause).await?;
    Ok(Json(jobs_client(&state, &ctx).pause_job(&id).await?))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{id}/resume",
    tag = "Jobs",
    params(("id" = String, Path, description = "Job id")),
    responses((status = 200, description = "Resumed job", body = Job)),
    security(("bearerAuth" = []))
)]
pub async fn resume_job(State(state): State<AppState>, ctx: AuthContext, Path(id): Path<String>) -> AppResult<Json<Job>> {
    guard(&state, &ctx, Action::Resume).await?;
    Ok(Json(jobs_client(&state, &ctx).resume_job(&id).await?))
}
