// Routing of refresh faults to error handlers.

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::counters::Counters;
use super::fault::RefreshFault;
use super::panic_message;

type HandlerFn = dyn Fn(&RefreshFault, DateTime<Utc>) -> anyhow::Result<()> + Send + Sync;

/// Callback invoked with a refresh fault and the time it happened.
pub struct ErrorHandler(Box<HandlerFn>);

impl ErrorHandler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RefreshFault, DateTime<Utc>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self(Box::new(f))
    }

    pub fn call(&self, fault: &RefreshFault, at: DateTime<Utc>) -> anyhow::Result<()> {
        (self.0)(fault, at)
    }
}

/// Swappable handler shared between a cache (or registry) and its observers.
pub type HandlerSlot = Arc<ArcSwapOption<ErrorHandler>>;

/// Creates an empty handler slot.
pub fn empty_slot() -> HandlerSlot {
    Arc::new(ArcSwapOption::empty())
}

/// Delivers each fault to exactly one handler: the cache's own, else the
/// registry default, else a log line.
pub struct ErrorObserver {
    cache: String,
    own: HandlerSlot,
    fallback: HandlerSlot,
    counters: Arc<Counters>,
}

impl ErrorObserver {
    pub fn new(
        cache: impl Into<String>,
        own: HandlerSlot,
        fallback: HandlerSlot,
        counters: Arc<Counters>,
    ) -> Self {
        Self {
            cache: cache.into(),
            own,
            fallback,
            counters,
        }
    }

    /// Routes `fault`. Never panics and never returns an error: a failing
    /// handler is logged and counted.
    pub fn observe(&self, fault: &RefreshFault, at: DateTime<Utc>) {
        let handler = self.own.load_full().or_else(|| self.fallback.load_full());
        match handler {
            Some(handler) => self.invoke(&handler, fault, at),
            None => self.log_fault(fault),
        }
    }

    fn invoke(&self, handler: &ErrorHandler, fault: &RefreshFault, at: DateTime<Utc>) {
        let failure = match catch_unwind(AssertUnwindSafe(|| handler.call(fault, at))) {
            Ok(Ok(())) => return,
            Ok(Err(e)) => format!("{e:#}"),
            Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
        };

        self.counters.record_handler_failure();
        tracing::error!(
            component = "refresh",
            cache = %self.cache,
            event = "handler_failed",
            fault = %fault,
            error = %failure,
            "error handler itself failed while handling refresh fault"
        );
    }

    fn log_fault(&self, fault: &RefreshFault) {
        match fault {
            RefreshFault::TimedOut(after) => {
                tracing::error!(
                    component = "refresh",
                    cache = %self.cache,
                    event = "timeout",
                    timeout = ?after,
                    "refresher timed out"
                );
            }
            RefreshFault::Failed(e) => {
                tracing::error!(
                    component = "refresh",
                    cache = %self.cache,
                    event = "refresh_failed",
                    error = ?e,
                    "refresher failed with error"
                );
            }
        }
    }
}
