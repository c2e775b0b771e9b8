use std::sync::Arc;

use serde_json::json;

use super::backend::SessionBackend;
use super::instrument::instrument;
use super::RequestHeaders;
use crate::errors::AppResult;
use crate::models::session::{Session, SessionWithUser};

/// Self-service session calls. No permission guard: they act on the caller's own sessions.
#[derive(Clone)]
pub struct SessionService {
    backend: Arc<dyn SessionBackend>,
}

impl SessionService {
    pub fn new(backend: Arc<dyn SessionBackend>) -> Self {
        Self { backend }
    }

    pub async fn get_session(&self, headers: &RequestHeaders) -> AppResult<Option<SessionWithUser>> {
        instrument("session.getSession", json!({}), self.backend.get_session(headers)).await
    }

    pub async fn list_sessions(&self, headers: &RequestHeaders) -> AppResult<Vec<Session>> {
        instrument("session.listSessions", json!({}), self.backend.list_sessions(headers)).await
    }

    pub async fn revoke_session(&self, headers: &RequestHeaders, token: &str) -> AppResult<()> {
        instrument(
            "session.revokeSession",
            json!({ "token": token }),
            self.backend.revoke_session(headers, token),
        )
        .await
    }

    pub async fn revoke_other_sessions(&self, headers: &RequestHeaders) -> AppResult<()> {
        instrument(
            "session.revokeOtherSessions",
            json!({}),
            self.backend.revoke_other_sessions(headers),
        )
        .await
    }
}
