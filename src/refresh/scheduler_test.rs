#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::anyhow;
    use parking_lot::Mutex;
    use tokio::runtime::Handle;
    use tokio::time::sleep;

    use crate::refresh::{Outcome, OutcomeObserver, Refresher, SchedulePlan, Scheduler};

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Value(usize),
        Failed(String),
        TimedOut,
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Seen>>,
        overruns: AtomicUsize,
    }

    impl OutcomeObserver<usize> for Recorder {
        fn on_outcome(&self, outcome: Outcome<usize>) {
            self.seen.lock().push(match outcome {
                Outcome::Refreshed(v) => Seen::Value(v),
                Outcome::Failed(e) => Seen::Failed(e.to_string()),
                Outcome::TimedOut(_) => Seen::TimedOut,
            });
        }

        fn on_overrun(&self) {
            self.overruns.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Recorder {
        fn seen(&self) -> Vec<Seen> {
            self.seen.lock().clone()
        }
    }

    fn plan(interval_ms: u64, timeout_ms: u64) -> SchedulePlan {
        SchedulePlan {
            base: Duration::from_millis(interval_ms),
            jitter: Duration::ZERO,
            interval: Duration::from_millis(interval_ms),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    fn counting() -> (Arc<AtomicUsize>, Arc<dyn Refresher<usize>>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let refresher: Arc<dyn Refresher<usize>> =
            Arc::new(move || {
                let c = c.clone();
                async move { anyhow::Ok(c.fetch_add(1, Ordering::SeqCst) + 1) }
            });
        (calls, refresher)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_execution_is_immediate() {
        let (_, refresher) = counting();
        let recorder = Arc::new(Recorder::default());
        let scheduler = Scheduler::spawn(&Handle::current(), "t", plan(10_000, 9_000), refresher, recorder.clone());

        sleep(Duration::from_millis(1)).await;
        assert_eq!(recorder.seen(), vec![Seen::Value(1)]);
        assert!(scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_executions_are_spaced_by_plan_interval() {
        let (calls, refresher) = counting();
        let recorder = Arc::new(Recorder::default());
        let _scheduler = Scheduler::spawn(&Handle::current(), "t", plan(1_000, 500), refresher, recorder.clone());

        sleep(Duration::from_millis(2_500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(recorder.seen(), vec![Seen::Value(1), Seen::Value(2), Seen::Value(3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_and_panic_are_reported_and_loop_continues() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let refresher: Arc<dyn Refresher<usize>> = Arc::new(move || {
            let c = c.clone();
            async move {
                match c.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(anyhow!("boom")),
                    1 => panic!("kaboom"),
                    n => Ok(n),
                }
            }
        });
        let recorder = Arc::new(Recorder::default());
        let _scheduler = Scheduler::spawn(&Handle::current(), "t", plan(1_000, 500), refresher, recorder.clone());

        sleep(Duration::from_millis(2_500)).await;
        let seen = recorder.seen();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], Seen::Failed("boom".to_string()));
        assert!(matches!(&seen[1], Seen::Failed(msg) if msg.contains("kaboom")));
        assert_eq!(seen[2], Seen::Value(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_disowns_execution_and_skips_overrun_ticks() {
        let finished = Arc::new(AtomicUsize::new(0));
        let f = finished.clone();
        let refresher: Arc<dyn Refresher<usize>> = Arc::new(move || {
            let f = f.clone();
            async move {
                sleep(Duration::from_millis(3_500)).await;
                f.fetch_add(1, Ordering::SeqCst);
                anyhow::Ok(7)
            }
        });
        let recorder = Arc::new(Recorder::default());
        let _scheduler = Scheduler::spawn(&Handle::current(), "t", plan(1_000, 100), refresher, recorder.clone());

        sleep(Duration::from_millis(3_200)).await;
        // Ticks at 1s, 2s and 3s find the first execution still running.
        assert_eq!(recorder.seen(), vec![Seen::TimedOut]);
        assert_eq!(recorder.overruns.load(Ordering::SeqCst), 3);

        sleep(Duration::from_millis(1_000)).await;
        // The disowned execution finished without being delivered; the 4s
        // tick started a fresh one.
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert!(!recorder.seen().contains(&Seen::Value(7)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_future_executions() {
        let (calls, refresher) = counting();
        let recorder = Arc::new(Recorder::default());
        let scheduler = Scheduler::spawn(&Handle::current(), "t", plan(1_000, 500), refresher, recorder.clone());

        sleep(Duration::from_millis(1_500)).await;
        scheduler.stop();
        assert!(!scheduler.is_running());

        sleep(Duration::from_millis(5_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_lets_in_flight_execution_complete() {
        let refresher: Arc<dyn Refresher<usize>> = Arc::new(|| async {
            sleep(Duration::from_millis(300)).await;
            anyhow::Ok(42)
        });
        let recorder = Arc::new(Recorder::default());
        let scheduler = Scheduler::spawn(&Handle::current(), "t", plan(10_000, 9_000), refresher, recorder.clone());

        sleep(Duration::from_millis(100)).await;
        scheduler.stop();
        sleep(Duration::from_millis(500)).await;

        assert_eq!(recorder.seen(), vec![Seen::Value(42)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_scheduling() {
        let (calls, refresher) = counting();
        let recorder = Arc::new(Recorder::default());
        let scheduler = Scheduler::spawn(&Handle::current(), "t", plan(1_000, 500), refresher, recorder.clone());

        sleep(Duration::from_millis(10)).await;
        drop(scheduler);
        sleep(Duration::from_millis(3_000)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
