use super::{CacheCfg, Config, Defaults, Logs, RefreshBox};
use std::collections::BTreeMap;
use std::time::Duration;

/// Creates a new test configuration.
pub fn new_test_config() -> Config {
    let mut caches = BTreeMap::new();
    caches.insert(
        "countries".to_string(),
        CacheCfg {
            source: "data/countries.json".into(),
            interval: Some(Duration::from_secs(30)),
        },
    );

    Config {
        refresh: RefreshBox {
            env: super::TEST.to_string(),
            logs: Some(Logs {
                level: Some("debug".to_string()),
            }),
            defaults: Some(Defaults {
                interval: Some(Duration::from_secs(60)),
                jitter_pct: Some(0.15),
                ..Defaults::default()
            }),
            metrics: None,
            stats: None,
            caches,
        },
    }
}
