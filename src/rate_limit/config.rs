use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::quota::{default_quotas, Quota};

/// Rate limiter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Permit actions when the backing store is unreachable.
    ///
    /// Availability-over-strictness trade-off: during an infrastructure
    /// outage requests keep flowing instead of all being denied. Every
    /// allowed-while-degraded action is logged.
    pub fail_open: bool,
    /// Role name -> quota. Replaces the built-in table when customized.
    pub quotas: HashMap<String, Quota>,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            fail_open: true,
            quotas: default_quotas(),
        }
    }
}

impl RateLimiterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the degraded-mode policy
    pub fn with_fail_open(mut self, enabled: bool) -> Self {
        self.fail_open = enabled;
        self
    }

    /// Override or add the quota for a role
    pub fn with_quota(mut self, role: &str, max_actions: u32, window_minutes: i64) -> Self {
        let description = format!("{role}: {max_actions} actions/{window_minutes}min");
        self.quotas.insert(
            role.to_string(),
            Quota::new(max_actions, window_minutes, description),
        );
        self
    }
}
