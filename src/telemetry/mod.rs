// Periodic stats logging for every cache of a registry.

use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::registry::CacheRegistry;

/// Logs one stats line per cache every `each` until `shutdown_token` fires.
pub async fn logger<K, V>(
    shutdown_token: CancellationToken,
    registry: Arc<CacheRegistry<K, V>>,
    each: Duration,
) where
    K: Eq + Hash + Clone + Display + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    let mut ticker = interval(each);
    // First tick fires immediately; nothing has run yet.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown_token.cancelled() => {
                tracing::debug!(component = "telemetry", "stats logger stopped");
                return;
            }
            _ = ticker.tick() => log_stats(&registry),
        }
    }
}

/// Emits the current stats of every cache.
pub fn log_stats<K, V>(registry: &CacheRegistry<K, V>)
where
    K: Eq + Hash + Clone + Display,
    V: Send + Sync + 'static,
{
    for (_, stats) in registry.stats() {
        let last_success = stats
            .last_success
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        let interval = stats
            .plan
            .map(|p| humantime::format_duration(p.interval).to_string())
            .unwrap_or_default();

        tracing::info!(
            component = "telemetry",
            cache = %stats.key,
            state = ?stats.state,
            running = stats.running,
            loaded = stats.loaded,
            generation = stats.generation,
            interval = %interval,
            successes = stats.counts.successes,
            failures = stats.counts.failures,
            timeouts = stats.counts.timeouts,
            overruns = stats.counts.overruns,
            handler_failures = stats.counts.handler_failures,
            last_success = %last_success,
            "refresh cache stats"
        );
    }
}

#[cfg(test)]
mod telemetry_test;
