//! # Status Types
//!
//! Status reported on every resource kind the controller manages. Each kind
//! shares the same shape: a single `Ready` condition, the generation that
//! was last acted on, and the Vault path the resource maps to.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The one condition type this controller maintains.
pub const CONDITION_READY: &str = "Ready";

/// The resource exists in Vault and matches its spec.
pub const REASON_AVAILABLE: &str = "Available";
/// The resource was absent from Vault and has just been written.
pub const REASON_CREATING: &str = "Creating";
/// The resource drifted from its spec and has just been rewritten.
pub const REASON_UPDATING: &str = "Updating";
/// The last reconcile attempt failed; the message carries the error.
pub const REASON_RECONCILE_ERROR: &str = "ReconcileError";

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub r#type: String,
    pub status: String,
    #[serde(default)]
    pub last_transition_time: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub observed_generation: Option<i64>,
    #[serde(default)]
    pub last_reconcile_time: Option<String>,
    /// Full Vault API path the resource is written to
    #[serde(default)]
    pub vault_path: Option<String>,
}

impl ResourceStatus {
    /// Build a status carrying a single `Ready` condition stamped with the
    /// current time.
    pub fn new(
        ready: bool,
        reason: &str,
        message: &str,
        generation: Option<i64>,
        vault_path: &str,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            conditions: vec![Condition {
                r#type: CONDITION_READY.to_string(),
                status: if ready { "True" } else { "False" }.to_string(),
                last_transition_time: Some(now.clone()),
                reason: Some(reason.to_string()),
                message: Some(message.to_string()),
            }],
            observed_generation: generation,
            last_reconcile_time: Some(now),
            vault_path: Some(vault_path.to_string()),
        }
    }

    /// True when both statuses report the same outcome, ignoring the
    /// timestamps. A reconcile whose status patch would only refresh the
    /// timestamps skips the patch, otherwise every patch would bump the
    /// resource version and schedule the next reconcile immediately.
    pub fn outcome_matches(&self, other: &Self) -> bool {
        self.observed_generation == other.observed_generation
            && self.vault_path == other.vault_path
            && self.conditions.len() == other.conditions.len()
            && self.conditions.iter().zip(&other.conditions).all(|(left, right)| {
                left.r#type == right.r#type
                    && left.status == right.status
                    && left.reason == right.reason
                    && left.message == right.message
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_status_has_true_condition() {
        let status = ResourceStatus::new(
            true,
            REASON_AVAILABLE,
            "role is in sync",
            Some(3),
            "auth/jwt/role/ci",
        );
        assert_eq!(status.conditions.len(), 1);
        let condition = &status.conditions[0];
        assert_eq!(condition.r#type, CONDITION_READY);
        assert_eq!(condition.status, "True");
        assert_eq!(condition.reason.as_deref(), Some(REASON_AVAILABLE));
        assert_eq!(status.observed_generation, Some(3));
        assert_eq!(status.vault_path.as_deref(), Some("auth/jwt/role/ci"));
        assert!(status.last_reconcile_time.is_some());
    }

    #[test]
    fn error_status_has_false_condition() {
        let status = ResourceStatus::new(
            false,
            REASON_RECONCILE_ERROR,
            "cannot read JWT/OIDC role",
            Some(1),
            "auth/jwt/role/ci",
        );
        assert_eq!(status.conditions[0].status, "False");
        assert_eq!(
            status.conditions[0].reason.as_deref(),
            Some(REASON_RECONCILE_ERROR)
        );
    }

    #[test]
    fn outcome_matches_ignores_timestamps() {
        let mut earlier =
            ResourceStatus::new(true, REASON_AVAILABLE, "in sync", Some(2), "sys/policies/acl/ci");
        let later =
            ResourceStatus::new(true, REASON_AVAILABLE, "in sync", Some(2), "sys/policies/acl/ci");
        earlier.last_reconcile_time = Some("2024-01-01T00:00:00Z".to_string());
        earlier.conditions[0].last_transition_time = Some("2024-01-01T00:00:00Z".to_string());
        assert!(earlier.outcome_matches(&later));
    }

    #[test]
    fn outcome_matches_detects_reason_change() {
        let creating =
            ResourceStatus::new(false, REASON_CREATING, "written", Some(2), "auth/jwt/role/ci");
        let available =
            ResourceStatus::new(true, REASON_AVAILABLE, "in sync", Some(2), "auth/jwt/role/ci");
        assert!(!creating.outcome_matches(&available));
    }

    #[test]
    fn outcome_matches_detects_generation_change() {
        let old = ResourceStatus::new(true, REASON_AVAILABLE, "in sync", Some(2), "auth/jwt/role/ci");
        let new = ResourceStatus::new(true, REASON_AVAILABLE, "in sync", Some(3), "auth/jwt/role/ci");
        assert!(!old.outcome_matches(&new));
    }
}
