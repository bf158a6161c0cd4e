use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

/// A quota store round trip failed (external store unreachable, timeout).
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Backing store for per-identifier action logs.
///
/// Implementations own the ordered timestamp log per key and must make
/// `check_and_increment` atomic per key: prune, compare, and record as one
/// step, so N concurrent checks against the same key can never admit more
/// than the limit. An external shared store implements this as a single
/// round trip — add the new entry, prune expired entries, count, and remove
/// the just-added entry again if the count exceeds the limit. Expiry/GC of
/// idle keys is the store's own concern (e.g. a TTL equal to the window).
pub trait QuotaStore: Send + Sync {
    /// Short backend name for stats/logging
    fn backend(&self) -> &'static str;

    /// Prune entries older than `now - window`, then record `now` if the
    /// surviving count is below `max_actions`.
    ///
    /// Returns `Ok(true)` when the action was recorded, `Ok(false)` when
    /// the key is at its limit (attempt not recorded).
    fn check_and_increment(
        &self,
        key: &str,
        max_actions: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Prune entries older than the window and report the surviving count
    /// plus the oldest surviving timestamp, without recording anything.
    fn prune_and_count(
        &self,
        key: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<(u32, Option<DateTime<Utc>>), StoreError>;

    /// Discard the entire log for a key
    fn clear(&self, key: &str) -> Result<(), StoreError>;

    /// (tracked identifiers, total recorded actions)
    fn stats(&self) -> Result<(usize, usize), StoreError>;
}

/// In-process store: one mutex-guarded timestamp log per identifier.
///
/// The `DashMap` shards key lookups; the per-key mutex makes the
/// prune-compare-append sequence a single critical section.
#[derive(Debug, Default)]
pub struct MemoryQuotaStore {
    logs: DashMap<String, Arc<Mutex<Vec<DateTime<Utc>>>>>,
}

impl MemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn log_for(&self, key: &str) -> Arc<Mutex<Vec<DateTime<Utc>>>> {
        self.logs.entry(key.to_string()).or_default().clone()
    }
}

impl QuotaStore for MemoryQuotaStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn check_and_increment(
        &self,
        key: &str,
        max_actions: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let slot = self.log_for(key);
        let mut log = slot.lock();

        let cutoff = now - window;
        log.retain(|ts| *ts > cutoff);

        if log.len() >= max_actions as usize {
            return Ok(false);
        }

        log.push(now);
        Ok(true)
    }

    fn prune_and_count(
        &self,
        key: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<(u32, Option<DateTime<Utc>>), StoreError> {
        let Some(slot) = self.logs.get(key).map(|entry| Arc::clone(entry.value())) else {
            return Ok((0, None));
        };
        let mut log = slot.lock();

        let cutoff = now - window;
        log.retain(|ts| *ts > cutoff);

        // Appends are in time order, so the head is the oldest survivor
        Ok((log.len() as u32, log.first().copied()))
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        self.logs.remove(key);
        Ok(())
    }

    fn stats(&self) -> Result<(usize, usize), StoreError> {
        let identifiers = self.logs.len();
        let actions = self
            .logs
            .iter()
            .map(|entry| entry.value().lock().len())
            .sum();
        Ok((identifiers, actions))
    }
}
