// Periodic execution of a refresher with a per-execution deadline.

use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::panic_message;
use super::refresher::Refresher;
use super::tunables::SchedulePlan;

/// Result of one execution.
pub enum Outcome<V> {
    Refreshed(V),
    Failed(anyhow::Error),
    /// Deadline elapsed; the execution keeps running detached.
    TimedOut(Duration),
}

/// Receives exactly one outcome per execution.
pub trait OutcomeObserver<V>: Send + Sync + 'static {
    fn on_outcome(&self, outcome: Outcome<V>);

    /// A tick was skipped because a disowned execution is still running.
    fn on_overrun(&self) {}
}

/// Background task driving one refresher.
///
/// Dropping the scheduler stops future scheduling.
pub struct Scheduler {
    name: String,
    plan: SchedulePlan,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Scheduler {
    /// Spawns the loop on `runtime`. The first execution fires immediately.
    pub fn spawn<V, O>(
        runtime: &Handle,
        name: impl Into<String>,
        plan: SchedulePlan,
        refresher: Arc<dyn Refresher<V>>,
        observer: Arc<O>,
    ) -> Self
    where
        V: Send + 'static,
        O: OutcomeObserver<V>,
    {
        let name = name.into();
        let token = CancellationToken::new();
        let handle = runtime.spawn(run_loop(
            name.clone(),
            plan,
            token.clone(),
            refresher,
            observer,
        ));

        Self {
            name,
            plan,
            token,
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plan(&self) -> SchedulePlan {
        self.plan
    }

    /// True until stopped or the loop exited.
    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled() && !self.handle.is_finished()
    }

    /// Cancels future executions. An execution in flight is left alone.
    pub fn stop(&self) {
        self.token.cancel();
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run_loop<V, O>(
    name: String,
    plan: SchedulePlan,
    token: CancellationToken,
    refresher: Arc<dyn Refresher<V>>,
    observer: Arc<O>,
) where
    V: Send + 'static,
    O: OutcomeObserver<V>,
{
    let mut ticker = tokio::time::interval(plan.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut disowned: Option<JoinHandle<anyhow::Result<V>>> = None;

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if let Some(execution) = disowned.as_ref() {
            if !execution.is_finished() {
                observer.on_overrun();
                continue;
            }
            // Late result of a timed out execution is dropped.
            disowned = None;
        }

        let job = Arc::clone(&refresher);
        let mut execution = tokio::spawn(async move { job.refresh().await });

        let outcome = match tokio::time::timeout(plan.timeout, &mut execution).await {
            Ok(Ok(Ok(value))) => Outcome::Refreshed(value),
            Ok(Ok(Err(e))) => Outcome::Failed(e),
            Ok(Err(e)) => Outcome::Failed(join_failure(e)),
            Err(_) => {
                disowned = Some(execution);
                Outcome::TimedOut(plan.timeout)
            }
        };
        observer.on_outcome(outcome);
    }

    tracing::debug!(
        component = "refresh",
        cache = %name,
        event = "scheduling_stopped",
        "refresher scheduling stopped"
    );
}

fn join_failure(e: JoinError) -> anyhow::Error {
    if e.is_panic() {
        anyhow::anyhow!("refresher panicked: {}", panic_message(e.into_panic().as_ref()))
    } else {
        anyhow::anyhow!("refresher execution was cancelled: {e}")
    }
}
