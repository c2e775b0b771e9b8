use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::errors::{AppError, AppResult};
use crate::models::job::{Job, JobCreateRequest, JobHistory};
use crate::models::page::Page;
use crate::proxy::{ProxyClient, ProxyError};

// Only used to borrow `Url`'s encoders; the host never leaves this module.
const ENDPOINT_ROOT: &str = "http://scheduler.invalid/";

/// Typed calls to the scheduler service, through the backend proxy.
#[derive(Debug, Clone)]
pub struct JobsClient {
    proxy: ProxyClient,
}

fn required<T>(endpoint: &str, value: Option<T>) -> AppResult<T> {
    value.ok_or_else(|| ProxyError::Empty(endpoint.to_string()).into())
}

/// Relative endpoint from raw path segments and query pairs.
///
/// Segments are percent-encoded one by one, so a job id can never add path
/// levels, a query or a fragment. Query values are form-encoded.
fn endpoint(segments: &[&str], query: &[(&str, String)]) -> AppResult<String> {
    let mut url = Url::parse(ENDPOINT_ROOT).map_err(|err| AppError::internal(err.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| AppError::internal("endpoint root cannot carry a path"))?
        .clear()
        .extend(segments);
    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(name, value)| (*name, value.as_str())));
    }

    let mut endpoint = url.path().trim_start_matches('/').to_string();
    if let Some(query) = url.query() {
        endpoint.push('?');
        endpoint.push_str(query);
    }
    Ok(endpoint)
}

/// `.` and `..` would be dropped by the encoder and change the target path.
fn job_id_segment(job_id: &str) -> AppResult<&str> {
    match job_id {
        "" | "." | ".." => Err(AppError::bad_request(format!("invalid job id `{job_id}`"))),
        _ => Ok(job_id),
    }
}

fn paging(page: u32, page_size: u32) -> Vec<(&'static str, String)> {
    vec![("page", page.to_string()), ("page_size", page_size.to_string())]
}

impl JobsClient {
    pub fn new(proxy: ProxyClient) -> Self {
        Self { proxy }
    }

    async fn fetch<T: DeserializeOwned>(&self, endpoint: &str) -> AppResult<T> {
        let value = self.proxy.get(endpoint).await?;
        required(endpoint, value)
    }

    async fn post_empty(&self, endpoint: &str) -> AppResult<Job> {
        let value = self.proxy.post(endpoint, &serde_json::json!({})).await?;
        required(endpoint, value)
    }

    pub async fn list_jobs(&self, page: u32, page_size: u32) -> AppResult<Page<Job>> {
        self.fetch(&endpoint(&["jobs"], &paging(page, page_size))?).await
    }

    pub async fn get_job(&self, job_id: &str) -> AppResult<Job> {
        self.fetch(&endpoint(&["jobs", job_id_segment(job_id)?], &[])?).await
    }

    pub async fn create_job(&self, req: &JobCreateRequest) -> AppResult<Job> {
        let value = self.proxy.post("jobs", req).await?;
        required("jobs", value)
    }

    pub async fn delete_job(&self, job_id: &str) -> AppResult<()> {
        let endpoint = endpoint(&["jobs", job_id_segment(job_id)?], &[])?;
        self.proxy.delete::<serde_json::Value>(&endpoint).await?;
        Ok(())
    }

    pub async fn pause_job(&self, job_id: &str) -> AppResult<Job> {
        self.post_empty(&endpoint(&["jobs", job_id_segment(job_id)?, "pause"], &[])?)
            .await
    }

    pub async fn resume_job(&self, job_id: &str) -> AppResult<Job> {
        self.post_empty(&endpoint(&["jobs", job_id_segment(job_id)?, "resume"], &[])?)
            .await
    }

    /// Execution history, optionally narrowed to one job.
    pub async fn list_history(&self, job_id: Option<&str>, page: u32, page_size: u32) -> AppResult<Page<JobHistory>> {
        let mut query = paging(page, page_size);
        if let Some(job_id) = job_id {
            query.push(("job_id", job_id.to_string()));
        }
        self.fetch(&endpoint(&["jobs", "history"], &query)?).await
    }
}
