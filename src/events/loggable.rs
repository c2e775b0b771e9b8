use serde::{Deserialize, Serialize};

/// Severity of an audit entry. Drives log level and retention downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Privilege or account state changes
    Critical,
    #[default]
    Important,
}

/// Entities that can appear in the audit log.
pub trait Loggable: Serialize + Send + Sync {
    /// Prefix of event names, e.g. "user" in "user.banned"
    fn entity_type() -> &'static str;

    fn subject_id(&self) -> String;

    fn severity(&self) -> Severity {
        Severity::Important
    }

    fn severity_for_action(&self, action: &str) -> Severity {
        match action {
            "deleted" => Severity::Critical,
            "created" | "updated" => self.severity(),
            _ => Severity::Important,
        }
    }
}
