use std::sync::Arc;

use serde_json::json;

use super::backend::EmailPasswordBackend;
use super::instrument::instrument;
use super::RequestHeaders;
use crate::errors::{AppError, AppResult};
use crate::models::user::{AuthResponse, ChangePasswordRequest, SignInRequest, SignUpRequest};

const MIN_PASSWORD_LENGTH: usize = 8;

fn check_password_length(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct EmailPasswordService {
    backend: Arc<dyn EmailPasswordBackend>,
}

impl EmailPasswordService {
    pub fn new(backend: Arc<dyn EmailPasswordBackend>) -> Self {
        Self { backend }
    }

    pub async fn sign_up(&self, headers: &RequestHeaders, req: &SignUpRequest) -> AppResult<AuthResponse> {
        check_password_length(&req.password)?;
        instrument("emailPassword.signUp", json!(req), self.backend.sign_up_email(headers, req)).await
    }

    pub async fn sign_in(&self, headers: &RequestHeaders, req: &SignInRequest) -> AppResult<AuthResponse> {
        instrument("emailPassword.signIn", json!(req), self.backend.sign_in_email(headers, req)).await
    }

    pub async fn sign_out(&self, headers: &RequestHeaders) -> AppResult<()> {
        instrument("emailPassword.signOut", json!({}), self.backend.sign_out(headers)).await
    }

    pub async fn change_password(&self, headers: &RequestHeaders, req: &ChangePasswordRequest) -> AppResult<()> {
        check_password_length(&req.new_password)?;
        instrument(
            "emailPassword.changePassword",
            json!(req),
            self.backend.change_password(headers, req),
        )
        .await
    }
}
