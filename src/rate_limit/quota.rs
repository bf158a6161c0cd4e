use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Caller role used for quota selection and error-detail policy.
///
/// Open-ended: unknown role strings are carried as [`Role::Other`] and fall
/// back to the `user` quota rather than failing, so unknown caller kinds
/// stay gated without breaking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
    Anonymous,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Anonymous => "anonymous",
            Role::Other(name) => name,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "admin" => Role::Admin,
            "user" => Role::User,
            "anonymous" => Role::Anonymous,
            other => Role::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-role action allowance within a sliding window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    pub max_actions: u32,
    pub window_minutes: i64,
    pub description: String,
}

impl Quota {
    pub fn new(max_actions: u32, window_minutes: i64, description: impl Into<String>) -> Self {
        Self {
            max_actions,
            window_minutes,
            description: description.into(),
        }
    }

    pub fn window(&self) -> Duration {
        Duration::minutes(self.window_minutes)
    }
}

/// Built-in quota table
pub(super) fn default_quotas() -> HashMap<String, Quota> {
    HashMap::from([
        (
            "admin".to_string(),
            Quota::new(50, 60, "Admin users: 50 actions/hour"),
        ),
        (
            "user".to_string(),
            Quota::new(10, 60, "Regular users: 10 actions/hour"),
        ),
        (
            "anonymous".to_string(),
            Quota::new(5, 60, "Anonymous users: 5 actions/hour"),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::from("admin"), Role::Admin);
        assert_eq!(Role::from("ADMIN"), Role::Admin);
        assert_eq!(Role::from("user"), Role::User);
        assert_eq!(Role::from("anonymous"), Role::Anonymous);
        assert_eq!(
            Role::from("superhero"),
            Role::Other("superhero".to_string())
        );
    }

    #[test]
    fn test_default_quota_table() {
        let quotas = default_quotas();
        assert_eq!(quotas["admin"].max_actions, 50);
        assert_eq!(quotas["user"].max_actions, 10);
        assert_eq!(quotas["anonymous"].max_actions, 5);
        assert!(quotas.values().all(|q| q.window_minutes == 60));
    }
}
