//! Refresh tunables and the per-start schedule plan.

use rand::Rng;
use std::time::Duration;

/// Default refresh interval of a freshly created cache.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);
/// Share of the interval used as jitter amplitude.
pub const REFRESH_INTERVAL_JITTER_PCT: f64 = 0.15;
/// Lower bound of the jitter amplitude.
pub const JITTER_FLOOR: Duration = Duration::from_millis(100);
/// Subtracted from the effective interval to get the execution deadline.
pub const TIMEOUT_SAFETY_MARGIN: Duration = Duration::from_secs(1);
/// Lower bound of the execution deadline.
pub const TIMEOUT_FLOOR: Duration = Duration::from_millis(100);

// tokio intervals must be non-zero.
const MIN_EFFECTIVE_INTERVAL: Duration = Duration::from_millis(10);

/// Global knobs shared by every cache of a registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tunables {
    pub default_interval: Duration,
    pub jitter_pct: f64,
    pub jitter_floor: Duration,
    pub timeout_margin: Duration,
    pub timeout_floor: Duration,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            default_interval: DEFAULT_REFRESH_INTERVAL,
            jitter_pct: REFRESH_INTERVAL_JITTER_PCT,
            jitter_floor: JITTER_FLOOR,
            timeout_margin: TIMEOUT_SAFETY_MARGIN,
            timeout_floor: TIMEOUT_FLOOR,
        }
    }
}

/// Interval and deadline drawn once per `start`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulePlan {
    /// Configured interval the plan was drawn from.
    pub base: Duration,
    /// Jitter amplitude around `base`.
    pub jitter: Duration,
    /// Spacing between executions.
    pub interval: Duration,
    /// Deadline of a single execution.
    pub timeout: Duration,
}

impl Tunables {
    /// Returns `max(jitter_floor, interval * jitter_pct)`, with `jitter_pct`
    /// clamped to `[0, 1]`.
    pub fn jitter_amount(&self, interval: Duration) -> Duration {
        let pct = if self.jitter_pct.is_finite() {
            self.jitter_pct.clamp(0.0, 1.0)
        } else {
            0.0
        };
        saturating_secs(interval.as_secs_f64() * pct).max(self.jitter_floor)
    }

    /// Draws a plan using the thread-local RNG.
    pub fn plan(&self, interval: Duration) -> SchedulePlan {
        self.plan_with(interval, &mut rand::thread_rng())
    }

    /// Draws a plan: the effective interval is uniform in
    /// `[interval - jitter, interval + jitter]` and the deadline is
    /// `max(effective - timeout_margin, timeout_floor)`.
    pub fn plan_with<R: Rng + ?Sized>(&self, interval: Duration, rng: &mut R) -> SchedulePlan {
        let jitter = self.jitter_amount(interval);
        let base = interval.as_secs_f64();
        let amplitude = jitter.as_secs_f64();

        let drawn = if amplitude > 0.0 {
            rng.gen_range((base - amplitude)..=(base + amplitude))
        } else {
            base
        };
        let effective = saturating_secs(drawn).max(MIN_EFFECTIVE_INTERVAL);
        let timeout = effective
            .saturating_sub(self.timeout_margin)
            .max(self.timeout_floor);

        SchedulePlan {
            base: interval,
            jitter,
            interval: effective,
            timeout,
        }
    }
}

/// Converts float seconds, saturating at `Duration::MAX`. NaN and negative
/// values become zero.
pub(crate) fn saturating_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}
