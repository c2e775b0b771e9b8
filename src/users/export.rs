use serde::Deserialize;
use utoipa::ToSchema;

use crate::errors::{AppError, AppResult};
use crate::models::user::User;

const CSV_HEADER: &str = "id,name,email,role,banned,emailVerified,createdAt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

pub fn to_csv(users: &[User]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for user in users {
        let fields = [
            user.id.clone(),
            user.name.clone(),
            user.email.clone(),
            user.role_or_default().to_string(),
            user.is_banned().to_string(),
            user.email_verified.to_string(),
            user.created_at.to_rfc3339(),
        ];
        let row: Vec<String> = fields.iter().map(|f| quote(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

pub fn to_json(users: &[User]) -> AppResult<String> {
    serde_json::to_string_pretty(users).map_err(|err| AppError::internal(err.to_string()))
}

pub fn export_users(users: &[User], format: ExportFormat) -> AppResult<String> {
    match format {
        ExportFormat::Csv => Ok(to_csv(users)),
        ExportFormat::Json => to_json(users),
    }
}
