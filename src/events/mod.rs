use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::auth::RequestHeaders;

pub mod loggable;
pub use loggable::{Loggable, Severity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
    pub actor_id: Option<String>,
    pub subject_id: Option<String>,
    pub payload: ActivityPayload,
}

pub type EventBus = broadcast::Sender<AuditEvent>;

pub fn init_event_bus() -> (EventBus, broadcast::Receiver<AuditEvent>) {
    broadcast::channel(1024)
}

/// Where a request came from, for the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn from_headers(headers: &RequestHeaders) -> Self {
        let ip = headers
            .get("x-forwarded-for")
            .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
            .or_else(|| headers.get("x-real-ip").map(String::from));

        let user_agent = headers.get("user-agent").map(String::from);

        Self { ip, user_agent }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPayload {
    #[serde(rename = "new")]
    pub current: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<RequestContext>,
    pub severity: Severity,
}

/// Publishes an audit event for `entity`. Never fails the caller.
pub fn log_activity<T: Loggable>(
    event_bus: &EventBus,
    action: &str,
    actor_id: Option<&str>,
    entity: &T,
    headers: &RequestHeaders,
) {
    log_activity_with_context(
        event_bus,
        action,
        actor_id,
        entity,
        None,
        Some(RequestContext::from_headers(headers)),
    );
}

pub fn log_activity_with_context<T: Loggable>(
    event_bus: &EventBus,
    action: &str,
    actor_id: Option<&str>,
    entity: &T,
    old_entity: Option<&T>,
    context: Option<RequestContext>,
) {
    let payload = ActivityPayload {
        current: serde_json::to_value(entity).unwrap_or_default(),
        old: old_entity.map(|e| serde_json::to_value(e).unwrap_or_default()),
        context,
        severity: entity.severity_for_action(action),
    };

    let event = AuditEvent {
        id: Uuid::new_v4(),
        name: format!("{}.{}", T::entity_type(), action),
        occurred_at: Utc::now(),
        actor_id: actor_id.map(String::from),
        subject_id: Some(entity.subject_id()),
        payload,
    };

    // no receivers is fine: the listener may not be running in tests
    let _ = event_bus.send(event);
}

/// Drains the bus into the `audit` log target until every sender is gone.
pub async fn start_audit_listener(mut rx: broadcast::Receiver<AuditEvent>) {
    tracing::info!("audit listener started");
    loop {
        match rx.recv().await {
            Ok(event) => write_audit_record(&event),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(target: "audit", skipped, "audit listener lagged, events dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
    tracing::info!("audit listener stopped");
}

fn write_audit_record(event: &AuditEvent) {
    let payload = serde_json::to_string(&event.payload).unwrap_or_default();
    let actor = event.actor_id.as_deref().unwrap_or("-");
    let subject = event.subject_id.as_deref().unwrap_or("-");

    match event.payload.severity {
        Severity::Critical => tracing::warn!(
            target: "audit",
            event_id = %event.id,
            event = %event.name,
            actor,
            subject,
            occurred_at = %event.occurred_at.to_rfc3339(),
            payload = %payload,
            "audit"
        ),
        Severity::Important => tracing::info!(
            target: "audit",
            event_id = %event.id,
            event = %event.name,
            actor,
            subject,
            occurred_at = %event.occurred_at.to_rfc3339(),
            payload = %payload,
            "audit"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rbac::Role;

    #[tokio::test]
    async fn activity_is_published_with_context() {
        let (bus, mut rx) = init_event_bus();
        let headers = RequestHeaders::new()
            .with("x-forwarded-for", "10.0.0.7, 10.0.0.1")
            .with("user-agent", "curl/8");
        let role = Role {
            name: "moderator".into(),
            permissions: vec![],
        };

        log_activity(&bus, "updated", Some("admin-1"), &role, &headers);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name, "role.updated");
        assert_eq!(event.actor_id.as_deref(), Some("admin-1"));
        assert_eq!(event.subject_id.as_deref(), Some("moderator"));
        assert_eq!(event.payload.severity, Severity::Critical);
        let context = event.payload.context.unwrap();
        assert_eq!(context.ip.as_deref(), Some("10.0.0.7"));
        assert_eq!(context.user_agent.as_deref(), Some("curl/8"));
    }

    #[test]
    fn publishing_without_listeners_is_silent() {
        let (bus, rx) = init_event_bus();
        drop(rx);
        let role = Role {
            name: "user".into(),
            permissions: vec![],
        };
        log_activity(&bus, "updated", None, &role, &RequestHeaders::new());
    }
}
