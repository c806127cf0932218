//! A named cache refreshed in the background.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

use super::error::{ConfigurationError, ReadError};
use super::publisher::{Publisher, Slot};
use crate::refresh::observer::empty_slot;
use crate::refresh::tunables::saturating_secs;
use crate::refresh::{
    BlockingRefresher, ErrorHandler, ErrorObserver, HandlerSlot, Lookup, OutcomeCounts,
    Refresher, SchedulePlan, Scheduler, Tunables,
};

/// Lifecycle of a cache's scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Unscheduled,
    Scheduled,
    Stopped,
}

/// Point-in-time view of a cache.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub key: String,
    pub state: RunState,
    pub running: bool,
    pub loaded: bool,
    pub generation: u64,
    pub plan: Option<SchedulePlan>,
    pub last_success: Option<DateTime<Utc>>,
    pub counts: OutcomeCounts,
}

struct Settings<V> {
    refresher: Option<Arc<dyn Refresher<V>>>,
    interval_secs: f64,
}

struct Run {
    state: RunState,
    plan: Option<SchedulePlan>,
    scheduler: Option<Scheduler>,
}

pub(crate) struct CacheInner<V> {
    tunables: Tunables,
    settings: Mutex<Settings<V>>,
    run: Mutex<Run>,
    started: AtomicBool,
    handler: HandlerSlot,
    default_handler: HandlerSlot,
    slot: Arc<Slot<V>>,
}

/// Handle to a cache. Clones share the same instance.
pub struct Cache<V>(Arc<CacheInner<V>>);

impl<V> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("key", &self.0.slot.key)
            .field("state", &self.0.run.lock().state)
            .field("generation", &self.0.slot.generation())
            .finish()
    }
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<V> Cache<V>
where
    V: Send + Sync + 'static,
{
    /// Creates a standalone cache with default tunables.
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_parts(key.into(), Tunables::default(), empty_slot())
    }

    /// Creates a standalone cache with custom tunables.
    pub fn with_tunables(key: impl Into<String>, tunables: Tunables) -> Self {
        Self::with_parts(key.into(), tunables, empty_slot())
    }

    /// `default_handler` is consulted when the cache has no handler of its own.
    pub(crate) fn with_parts(key: String, tunables: Tunables, default_handler: HandlerSlot) -> Self {
        Self(Arc::new(CacheInner {
            settings: Mutex::new(Settings {
                refresher: None,
                interval_secs: tunables.default_interval.as_secs_f64(),
            }),
            tunables,
            run: Mutex::new(Run {
                state: RunState::Unscheduled,
                plan: None,
                scheduler: None,
            }),
            started: AtomicBool::new(false),
            handler: empty_slot(),
            default_handler,
            slot: Arc::new(Slot::new(key)),
        }))
    }

    pub fn key(&self) -> &str {
        &self.0.slot.key
    }

    /// Sets the producer of snapshots. Takes effect on the next `start`.
    pub fn set_refresher<R: Refresher<V>>(&self, refresher: R) {
        self.0.settings.lock().refresher = Some(Arc::new(refresher));
    }

    /// Sets a synchronous producer, run on the blocking pool.
    pub fn set_blocking_refresher<F>(&self, f: F)
    where
        F: Fn() -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.set_refresher(BlockingRefresher::new(f));
    }

    pub fn clear_refresher(&self) {
        self.0.settings.lock().refresher = None;
    }

    pub fn has_refresher(&self) -> bool {
        self.0.settings.lock().refresher.is_some()
    }

    /// Stored as is; validated by `start`.
    pub fn set_refresh_interval(&self, interval: Duration) {
        self.set_refresh_interval_secs(interval.as_secs_f64());
    }

    /// Stored as is; zero, negative and non-finite values are rejected by `start`.
    pub fn set_refresh_interval_secs(&self, secs: f64) {
        self.0.settings.lock().interval_secs = secs;
    }

    pub fn refresh_interval_secs(&self) -> f64 {
        self.0.settings.lock().interval_secs
    }

    /// Configured interval, or `None` if it is not positive and finite.
    pub fn refresh_interval(&self) -> Option<Duration> {
        interval_from_secs(self.refresh_interval_secs())
    }

    /// Overrides the registry default error handler for this cache.
    pub fn set_error_handler(&self, handler: ErrorHandler) {
        self.0.handler.store(Some(Arc::new(handler)));
    }

    pub fn clear_error_handler(&self) {
        self.0.handler.store(None);
    }

    /// Checks what `start` checks, without scheduling anything.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.prepare().map(|_| ())
    }

    fn prepare(&self) -> Result<(Arc<dyn Refresher<V>>, Duration, Handle), ConfigurationError> {
        let key = || self.key().to_string();
        let (refresher, secs) = {
            let settings = self.0.settings.lock();
            (settings.refresher.clone(), settings.interval_secs)
        };

        let refresher = refresher.ok_or_else(|| ConfigurationError::MissingRefresher { key: key() })?;
        let interval = interval_from_secs(secs)
            .ok_or_else(|| ConfigurationError::InvalidInterval { key: key(), secs })?;
        let runtime = Handle::try_current().map_err(|_| ConfigurationError::NoRuntime { key: key() })?;

        Ok((refresher, interval, runtime))
    }

    /// Schedules the refresher: immediately, then every jittered interval.
    /// Replaces a running schedule. Returns whether the scheduler is running.
    pub fn start(&self) -> Result<bool, ConfigurationError> {
        let (refresher, interval, runtime) = self.prepare()?;
        let plan = self.0.tunables.plan(interval);

        let mut run = self.0.run.lock();
        if let Some(previous) = run.scheduler.take() {
            previous.stop();
        }

        let generation = self.0.slot.next_generation();
        let errors = ErrorObserver::new(
            self.key(),
            Arc::clone(&self.0.handler),
            Arc::clone(&self.0.default_handler),
            Arc::clone(&self.0.slot.counters),
        );
        let publisher = Arc::new(Publisher::new(Arc::clone(&self.0.slot), generation, errors));
        let scheduler = Scheduler::spawn(&runtime, self.key(), plan, refresher, publisher);

        tracing::debug!(
            component = "refresh",
            cache = %self.key(),
            event = "scheduling_started",
            interval = ?plan.interval,
            timeout = ?plan.timeout,
            generation,
            "starting refresher, updating every {:.1}s",
            plan.interval.as_secs_f64()
        );

        let running = scheduler.is_running();
        run.scheduler = Some(scheduler);
        run.plan = Some(plan);
        run.state = RunState::Scheduled;
        self.0.started.store(true, Ordering::Release);

        Ok(running)
    }

    /// Cancels future refreshes. The snapshot is kept.
    pub fn stop(&self) {
        let mut run = self.0.run.lock();
        if run.state != RunState::Scheduled {
            return;
        }
        if let Some(scheduler) = run.scheduler.take() {
            scheduler.stop();
        }
        run.state = RunState::Stopped;

        tracing::debug!(
            component = "refresh",
            cache = %self.key(),
            event = "stopped",
            "refresher stopped, snapshot retained"
        );
    }

    /// Stops and starts again with a fresh jitter draw and an immediate refresh.
    pub fn restart(&self) -> Result<bool, ConfigurationError> {
        self.stop();
        self.start()
    }

    /// Returns the current snapshot.
    pub fn get(&self) -> Result<Arc<V>, ReadError> {
        if !self.0.started.load(Ordering::Acquire) {
            return Err(ReadError::NotStarted {
                key: self.key().to_string(),
            });
        }
        self.0.slot.snapshot.load_full().ok_or_else(|| ReadError::NotYetLoaded {
            key: self.key().to_string(),
        })
    }

    /// Looks `key` up in the current snapshot.
    pub fn get_key<Q>(&self, key: &Q) -> Result<Option<V::Output>, ReadError>
    where
        Q: ?Sized,
        V: Lookup<Q>,
    {
        Ok(self.get()?.lookup(key))
    }

    /// Waits for the first published snapshot.
    pub async fn wait_until_loaded(&self, timeout: Duration) -> Result<Arc<V>, ReadError> {
        if !self.0.started.load(Ordering::Acquire) {
            return Err(ReadError::NotStarted {
                key: self.key().to_string(),
            });
        }

        let mut published = self.0.slot.subscribe();
        if let Some(snapshot) = self.0.slot.snapshot.load_full() {
            return Ok(snapshot);
        }

        let waited = tokio::time::timeout(timeout, published.wait_for(|n| *n > 0))
            .await
            .map(|r| r.is_ok());
        if waited.is_err() {
            return Err(ReadError::LoadTimeout {
                key: self.key().to_string(),
                waited: timeout,
            });
        }

        self.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.0.slot.snapshot.load().is_some()
    }

    pub fn is_running(&self) -> bool {
        self.0
            .run
            .lock()
            .scheduler
            .as_ref()
            .is_some_and(Scheduler::is_running)
    }

    pub fn run_state(&self) -> RunState {
        self.0.run.lock().state
    }

    /// Plan drawn by the last `start`.
    pub fn plan(&self) -> Option<SchedulePlan> {
        self.0.run.lock().plan
    }

    pub fn stats(&self) -> CacheStats {
        let (state, running, plan) = {
            let run = self.0.run.lock();
            let running = run.scheduler.as_ref().is_some_and(Scheduler::is_running);
            (run.state, running, run.plan)
        };
        CacheStats {
            key: self.key().to_string(),
            state,
            running,
            loaded: self.is_loaded(),
            generation: self.0.slot.generation(),
            plan,
            last_success: self.0.slot.counters.last_success(),
            counts: self.0.slot.counters.snapshot(),
        }
    }
}

// Positive finite seconds; values beyond `Duration::MAX` saturate.
fn interval_from_secs(secs: f64) -> Option<Duration> {
    (secs.is_finite() && secs > 0.0).then(|| saturating_secs(secs))
}
