use crate::errors::AppError;

const DEFAULT_AUTH_URL: &str = "http://localhost:3000";
const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_PORT: u16 = 3001;
const MIN_SECRET_LEN: usize = 32;

/// Process configuration read from the environment (`.env` is loaded by `main`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres URL; the health check reports the database as down without it.
    pub database_url: Option<String>,
    pub auth_secret: String,
    /// Origin of the auth service (`BETTER_AUTH_URL`).
    pub auth_url: String,
    /// Origin of the backend REST API the proxy route forwards to.
    pub api_url: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let auth_secret = var("BETTER_AUTH_SECRET")
            .ok_or_else(|| AppError::configuration("BETTER_AUTH_SECRET not set"))?;
        if auth_secret.len() < MIN_SECRET_LEN {
            tracing::warn!(
                "BETTER_AUTH_SECRET is shorter than {MIN_SECRET_LEN} characters; use a longer random value"
            );
        }

        let port = match var("APP_PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| AppError::configuration("APP_PORT must be a valid port number"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            database_url: var("DATABASE_URL").map(|url| normalize_database_url(&url)),
            auth_secret,
            auth_url: trim_origin(var("BETTER_AUTH_URL").as_deref().unwrap_or(DEFAULT_AUTH_URL)),
            api_url: trim_origin(var("NEXT_PUBLIC_API_URL").as_deref().unwrap_or(DEFAULT_API_URL)),
            port,
        })
    }
}

/// Drops the driver suffix some tooling puts in the scheme (`postgresql+asyncpg://`).
pub fn normalize_database_url(url: &str) -> String {
    url.replacen("+asyncpg", "", 1)
}

fn trim_origin(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
