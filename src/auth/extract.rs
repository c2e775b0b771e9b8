use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::RequestHeaders;
use crate::app::AppState;
use crate::authz::Subject;
use crate::errors::AppError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Who is calling, plus the headers to forward on their behalf.
///
/// Never rejects a request for lacking credentials: an anonymous subject is
/// handed to the permission guard, which answers UNAUTHORIZED.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub subject: Subject,
    pub headers: RequestHeaders,
    /// Token of the resolved session, when the caller came in with one.
    pub session_token: Option<String>,
}

impl AuthContext {
    pub fn new(subject: Subject, headers: RequestHeaders) -> Self {
        Self {
            subject,
            headers,
            session_token: None,
        }
    }

    /// Bearer credential for the backend API: the caller's own bearer token, else the session token.
    pub fn backend_token(&self) -> Option<&str> {
        self.headers.bearer_token().or(self.session_token.as_deref())
    }

    pub fn actor_id(&self) -> Option<&str> {
        self.subject.user_id.as_deref()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let headers = RequestHeaders::from_headers(&parts.headers);

        if let Some(key) = headers.get(API_KEY_HEADER) {
            let verification = state.api_keys.verify(key, None).await?;
            let key = match verification.key {
                Some(key) if verification.valid && key.enabled => key,
                _ => return Err(AppError::unauthorized("invalid API key")),
            };
            let subject = Subject::api_key(key.permissions.unwrap_or_default()).with_user_id(key.user_id);
            return Ok(AuthContext::new(subject, headers));
        }

        let ctx = match state.sessions.get_session(&headers).await? {
            Some(current) => {
                let subject = Subject::user(current.user.id.clone(), current.user.role_or_default());
                AuthContext {
                    subject,
                    headers,
                    session_token: Some(current.session.token),
                }
            }
            None => AuthContext::new(Subject::anonymous(), headers),
        };

        Ok(ctx)
    }
}
