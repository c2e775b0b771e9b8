use std::error::Error as _;
use std::future::Future;
use std::time::Instant;

use serde_json::Value;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

const REDACTED: &str = "[REDACTED]";
const SENSITIVE_MARKERS: &[&str] = &["password", "token", "key", "secret"];

/// True for parameter names that must never reach the logs.
pub fn is_sensitive_key(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    SENSITIVE_MARKERS.iter().any(|marker| name.contains(marker))
}

/// Replaces values under sensitive keys, at any depth.
pub fn redact(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(name, inner)| {
                    if is_sensitive_key(&name) {
                        (name, Value::String(REDACTED.to_string()))
                    } else {
                        (name, redact(inner))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(redact).collect()),
        other => other,
    }
}

fn source_chain(err: &AppError) -> String {
    let mut chain = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain.join(" <- ")
}

/// Times an auth-service call and logs one structured record for it.
///
/// The result is returned untouched; errors are logged and passed on.
pub async fn instrument<T, F>(method: &'static str, params: Value, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    let call_id = Uuid::new_v4();
    let params = redact(params).to_string();
    let started = Instant::now();

    let result = call.await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match &result {
        Ok(_) => tracing::info!(
            %call_id,
            method,
            duration_ms,
            params = %params,
            "auth call succeeded"
        ),
        Err(err) => tracing::error!(
            %call_id,
            method,
            duration_ms,
            params = %params,
            error_kind = err.kind(),
            error_message = %err,
            error_chain = %source_chain(err),
            "auth call failed"
        ),
    }

    result
}
