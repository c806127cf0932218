// Per-cache refresh counters.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::metrics;

/// Counters for refresh outcomes of one cache.
pub struct Counters {
    cache: String,
    /// Published snapshots.
    pub successes: AtomicI64,
    /// Refresher errors and panics.
    pub failures: AtomicI64,
    /// Executions that overran their deadline.
    pub timeouts: AtomicI64,
    /// Ticks skipped because a disowned execution was still running.
    pub overruns: AtomicI64,
    /// Error handlers that themselves failed.
    pub handler_failures: AtomicI64,
    last_success_ms: AtomicI64,
}

impl Counters {
    /// Creates zeroed counters for `cache`.
    pub fn new(cache: impl Into<String>) -> Self {
        Self {
            cache: cache.into(),
            successes: AtomicI64::new(0),
            failures: AtomicI64::new(0),
            timeouts: AtomicI64::new(0),
            overruns: AtomicI64::new(0),
            handler_failures: AtomicI64::new(0),
            last_success_ms: AtomicI64::new(0),
        }
    }

    pub fn record_success(&self, at: DateTime<Utc>) {
        self.successes.fetch_add(1, Ordering::Relaxed);
        self.last_success_ms.store(at.timestamp_millis(), Ordering::Relaxed);
        metrics::inc_success(&self.cache);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        metrics::inc_failure(&self.cache);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
        metrics::inc_timeout(&self.cache);
    }

    pub fn record_overrun(&self) -> i64 {
        metrics::inc_overrun(&self.cache);
        self.overruns.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_handler_failure(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
        metrics::inc_handler_failure(&self.cache);
    }

    /// Time of the last published snapshot.
    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        match self.last_success_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Utc.timestamp_millis_opt(ms).single(),
        }
    }

    /// Reads all counters.
    pub fn snapshot(&self) -> OutcomeCounts {
        OutcomeCounts {
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`Counters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub successes: i64,
    pub failures: i64,
    pub timeouts: i64,
    pub overruns: i64,
    pub handler_failures: i64,
}
