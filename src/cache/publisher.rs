// Snapshot slot and the generation-guarded publisher fed by the scheduler.

use arc_swap::ArcSwapOption;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::refresh::{Counters, ErrorObserver, Outcome, OutcomeObserver, RefreshFault};

/// Current snapshot of one cache plus its publication bookkeeping.
pub(crate) struct Slot<V> {
    pub(crate) key: String,
    pub(crate) snapshot: ArcSwapOption<V>,
    pub(crate) counters: Arc<Counters>,
    generation: AtomicU64,
    // Serializes generation bumps against publication.
    publish_mu: Mutex<()>,
    published: watch::Sender<u64>,
}

impl<V> Slot<V> {
    pub(crate) fn new(key: String) -> Self {
        let (published, _) = watch::channel(0);
        Self {
            counters: Arc::new(Counters::new(key.clone())),
            key,
            snapshot: ArcSwapOption::empty(),
            generation: AtomicU64::new(0),
            publish_mu: Mutex::new(()),
            published,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Invalidates every execution scheduled so far.
    pub(crate) fn next_generation(&self) -> u64 {
        let _guard = self.publish_mu.lock();
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<u64> {
        self.published.subscribe()
    }

    /// Swaps in `value` unless `generation` is stale.
    fn publish(&self, generation: u64, value: V) -> bool {
        let _guard = self.publish_mu.lock();
        if self.generation.load(Ordering::Acquire) != generation {
            return false;
        }
        self.snapshot.store(Some(Arc::new(value)));
        self.published.send_modify(|n| *n += 1);
        true
    }
}

/// Scheduler observer of one generation: publishes successes, routes faults.
pub(crate) struct Publisher<V> {
    slot: Arc<Slot<V>>,
    generation: u64,
    errors: ErrorObserver,
}

impl<V> Publisher<V> {
    pub(crate) fn new(slot: Arc<Slot<V>>, generation: u64, errors: ErrorObserver) -> Self {
        Self {
            slot,
            generation,
            errors,
        }
    }

    fn is_stale(&self) -> bool {
        self.slot.generation() != self.generation
    }
}

impl<V> OutcomeObserver<V> for Publisher<V>
where
    V: Send + Sync + 'static,
{
    fn on_outcome(&self, outcome: Outcome<V>) {
        let at = Utc::now();
        let fault = match outcome {
            Outcome::Refreshed(value) => {
                if self.slot.publish(self.generation, value) {
                    self.slot.counters.record_success(at);
                    tracing::debug!(
                        component = "refresh",
                        cache = %self.slot.key,
                        event = "refreshed",
                        generation = self.generation,
                        "snapshot published"
                    );
                } else {
                    tracing::debug!(
                        component = "refresh",
                        cache = %self.slot.key,
                        event = "stale_result",
                        generation = self.generation,
                        "discarded result of a superseded schedule"
                    );
                }
                return;
            }
            Outcome::Failed(e) => RefreshFault::Failed(e),
            Outcome::TimedOut(after) => RefreshFault::TimedOut(after),
        };

        // Superseded schedules neither count nor route their faults.
        if self.is_stale() {
            tracing::debug!(
                component = "refresh",
                cache = %self.slot.key,
                event = "stale_fault",
                generation = self.generation,
                fault = %fault,
                "fault of a superseded schedule dropped"
            );
            return;
        }
        if fault.is_timeout() {
            self.slot.counters.record_timeout();
        } else {
            self.slot.counters.record_failure();
        }
        self.errors.observe(&fault, at);
    }

    fn on_overrun(&self) {
        let overruns = self.slot.counters.record_overrun();
        tracing::warn!(
            component = "refresh",
            cache = %self.slot.key,
            event = "overrun",
            overruns,
            "previous refresh still running past its deadline, skipping tick"
        );
    }
}
