#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    use crate::registry::CacheRegistry;
    use crate::support::{exact_tunables, map_of, LogCapture, Map};
    use crate::telemetry;

    #[tokio::test(start_paused = true)]
    async fn test_logger_reports_each_cache_until_cancelled() {
        let (logs, _guard) = LogCapture::install();
        let registry: Arc<CacheRegistry<String, Map>> =
            Arc::new(CacheRegistry::with_tunables(exact_tunables()));
        registry
            .get_or_create("countries".to_string())
            .unwrap()
            .set_refresher(|| async { anyhow::Ok(map_of("fr", "France")) });
        registry.get_or_create("idle".to_string()).unwrap();

        let c = registry.get(&"countries".to_string()).unwrap();
        c.start().unwrap();

        let token = CancellationToken::new();
        let task = tokio::spawn(telemetry::logger(
            token.clone(),
            Arc::clone(&registry),
            Duration::from_secs(1),
        ));

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        token.cancel();
        task.await.unwrap();

        let out = logs.contents();
        assert!(out.contains("refresh cache stats"));
        assert!(out.contains("cache=countries"));
        assert!(out.contains("cache=idle"));
        assert!(out.contains("successes=1"));
        assert!(out.contains("last_success=never"));
        assert!(out.contains("stats logger stopped"));
    }
}
