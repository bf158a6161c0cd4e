use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::quota::{Quota, Role};
use super::store::{MemoryQuotaStore, QuotaStore};
use super::{RateLimitError, RateLimiterConfig};

/// Fallback when a custom quota table omits the `user` role entirely
static FALLBACK_QUOTA: Lazy<Quota> =
    Lazy::new(|| Quota::new(10, 60, "Regular users: 10 actions/hour"));

/// Remaining-allowance snapshot for an identifier/role pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemainingQuota {
    pub remaining: u32,
    pub limit: u32,
    pub window_minutes: i64,
    /// When the log next has room: oldest surviving entry + window, or now
    /// when the log is empty
    pub reset_at: DateTime<Utc>,
}

/// Limiter-wide observability snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimiterStats {
    pub backend: &'static str,
    pub total_identifiers: usize,
    pub total_actions: usize,
    pub quotas: HashMap<String, Quota>,
}

/// Role-quota rate limiter over a pluggable [`QuotaStore`].
///
/// Construct one instance per process/configuration and pass it to callers
/// explicitly; there is no global default.
pub struct RateLimiter {
    config: RateLimiterConfig,
    store: Arc<dyn QuotaStore>,
}

impl RateLimiter {
    /// Limiter backed by the in-process store
    pub fn new(config: RateLimiterConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryQuotaStore::new()))
    }

    /// Limiter backed by a caller-supplied store (e.g. an external shared
    /// service)
    pub fn with_store(config: RateLimiterConfig, store: Arc<dyn QuotaStore>) -> Self {
        Self { config, store }
    }

    fn quota_for(&self, role: &Role) -> &Quota {
        self.config
            .quotas
            .get(role.as_str())
            .or_else(|| self.config.quotas.get("user"))
            .unwrap_or(&FALLBACK_QUOTA)
    }

    fn key_for(identifier: &str) -> String {
        format!("actions:{identifier}")
    }

    /// Check whether `identifier` may perform another action under `role`'s
    /// quota, recording the action on success.
    ///
    /// A denied attempt is not recorded. A store failure follows the
    /// configured fail-open policy and is logged as a degraded-mode event.
    pub fn check_limit(&self, identifier: &str, role: &Role) -> Result<(), RateLimitError> {
        let quota = self.quota_for(role);
        let key = Self::key_for(identifier);

        match self
            .store
            .check_and_increment(&key, quota.max_actions, quota.window(), Utc::now())
        {
            Ok(true) => {
                debug!(
                    identifier,
                    role = %role,
                    limit = quota.max_actions,
                    "rate limit check passed"
                );
                Ok(())
            }
            Ok(false) => {
                warn!(
                    identifier,
                    role = %role,
                    limit = quota.max_actions,
                    window_minutes = quota.window_minutes,
                    "rate limit exceeded"
                );
                Err(RateLimitError::Exceeded {
                    role: role.as_str().to_string(),
                    limit: quota.max_actions,
                    window_minutes: quota.window_minutes,
                })
            }
            Err(store_err) => {
                if self.config.fail_open {
                    warn!(
                        identifier,
                        error = %store_err,
                        "quota store unavailable, failing open (degraded mode)"
                    );
                    Ok(())
                } else {
                    Err(RateLimitError::StoreUnavailable(store_err.to_string()))
                }
            }
        }
    }

    /// Report the remaining allowance without recording an action.
    pub fn get_remaining(
        &self,
        identifier: &str,
        role: &Role,
    ) -> Result<RemainingQuota, RateLimitError> {
        let quota = self.quota_for(role);
        let key = Self::key_for(identifier);
        let now = Utc::now();

        let (count, oldest) = match self.store.prune_and_count(&key, quota.window(), now) {
            Ok(snapshot) => snapshot,
            Err(store_err) => {
                if self.config.fail_open {
                    warn!(
                        identifier,
                        error = %store_err,
                        "quota store unavailable, reporting full quota (degraded mode)"
                    );
                    (0, None)
                } else {
                    return Err(RateLimitError::StoreUnavailable(store_err.to_string()));
                }
            }
        };

        Ok(RemainingQuota {
            remaining: quota.max_actions.saturating_sub(count),
            limit: quota.max_actions,
            window_minutes: quota.window_minutes,
            reset_at: oldest.map_or(now, |ts| ts + quota.window()),
        })
    }

    /// Discard the action log for an identifier. Privileged operation;
    /// authorization is the caller's responsibility.
    pub fn reset(&self, identifier: &str) -> Result<(), RateLimitError> {
        let key = Self::key_for(identifier);
        match self.store.clear(&key) {
            Ok(()) => {
                debug!(identifier, "rate limit reset");
                Ok(())
            }
            Err(store_err) => {
                if self.config.fail_open {
                    warn!(identifier, error = %store_err, "quota store reset failed");
                    Ok(())
                } else {
                    Err(RateLimitError::StoreUnavailable(store_err.to_string()))
                }
            }
        }
    }

    pub fn get_stats(&self) -> RateLimiterStats {
        let (total_identifiers, total_actions) = self.store.stats().unwrap_or_else(|store_err| {
            warn!(error = %store_err, "quota store stats unavailable");
            (0, 0)
        });
        RateLimiterStats {
            backend: self.store.backend(),
            total_identifiers,
            total_actions,
            quotas: self.config.quotas.clone(),
        }
    }
}
