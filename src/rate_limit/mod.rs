//! Sliding-window rate limiting with role-based quotas.
//!
//! Each identifier (user id or IP) owns an ordered log of recent action
//! timestamps; entries older than the active window are pruned lazily on
//! every check, never by a background sweep. The check-and-increment is
//! atomic per identifier so concurrent callers can never race past the
//! configured limit. The backing store is pluggable: [`MemoryQuotaStore`]
//! ships in-process; external shared stores implement [`QuotaStore`] with
//! the same atomicity contract. When a store is unreachable the limiter
//! follows the configured [`RateLimiterConfig::fail_open`] policy.

mod config;
mod limiter;
mod quota;
mod store;

pub use config::RateLimiterConfig;
pub use limiter::{RateLimiter, RateLimiterStats, RemainingQuota};
pub use quota::{Quota, Role};
pub use store::{MemoryQuotaStore, QuotaStore, StoreError};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateLimitError {
    #[error(
        "Rate limit exceeded for {role}. Limit: {limit} actions per {window_minutes} minutes. \
         Try again later"
    )]
    Exceeded {
        role: String,
        limit: u32,
        window_minutes: i64,
    },

    /// Surfaced only when the limiter is configured fail-closed
    #[error("Quota store unavailable: {0}")]
    StoreUnavailable(String),
}
