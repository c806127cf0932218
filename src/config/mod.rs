// Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::refresh::Tunables;

pub const PROD: &str = "prod";
pub const TEST: &str = "test";

const DEFAULT_METRICS_LISTEN: &str = "0.0.0.0:9100";
const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(rename = "refresh")]
    pub refresh: RefreshBox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshBox {
    pub env: String,
    pub logs: Option<Logs>,
    pub defaults: Option<Defaults>,
    pub metrics: Option<Metrics>,
    pub stats: Option<Stats>,
    #[serde(default)]
    pub caches: BTreeMap<String, CacheCfg>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logs {
    pub level: Option<String>,
}

/// Registry-wide refresh knobs. Missing fields keep the built-in values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default, with = "humantime_serde")]
    pub interval: Option<Duration>,
    pub jitter_pct: Option<f64>,
    #[serde(default, with = "humantime_serde")]
    pub jitter_floor: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub timeout_margin: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub timeout_floor: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Metrics {
    pub enabled: bool,
    pub listen: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Stats {
    #[serde(default, with = "humantime_serde")]
    pub interval: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheCfg {
    pub source: PathBuf,
    #[serde(default, with = "humantime_serde")]
    pub interval: Option<Duration>,
}

// Config trait
pub trait ConfigTrait {
    fn logs(&self) -> Option<&Logs>;
    fn is_prod(&self) -> bool;
    #[allow(dead_code)]
    fn is_test(&self) -> bool;
    fn tunables(&self) -> Tunables;
    fn caches(&self) -> &BTreeMap<String, CacheCfg>;
    fn metrics_listen(&self) -> Result<Option<SocketAddr>>;
    fn stats_interval(&self) -> Duration;
}

impl ConfigTrait for Config {
    fn logs(&self) -> Option<&Logs> {
        self.refresh.logs.as_ref()
    }

    fn is_prod(&self) -> bool {
        self.refresh.env == PROD
    }

    fn is_test(&self) -> bool {
        self.refresh.env == TEST
    }

    fn tunables(&self) -> Tunables {
        let mut t = Tunables::default();
        if let Some(d) = self.refresh.defaults.as_ref() {
            t.default_interval = d.interval.unwrap_or(t.default_interval);
            t.jitter_pct = d.jitter_pct.unwrap_or(t.jitter_pct);
            t.jitter_floor = d.jitter_floor.unwrap_or(t.jitter_floor);
            t.timeout_margin = d.timeout_margin.unwrap_or(t.timeout_margin);
            t.timeout_floor = d.timeout_floor.unwrap_or(t.timeout_floor);
        }
        t
    }

    fn caches(&self) -> &BTreeMap<String, CacheCfg> {
        &self.refresh.caches
    }

    /// Scrape listener address, or `None` when metrics are disabled.
    fn metrics_listen(&self) -> Result<Option<SocketAddr>> {
        match self.refresh.metrics.as_ref() {
            Some(m) if m.enabled => {
                let listen = m.listen.as_deref().unwrap_or(DEFAULT_METRICS_LISTEN);
                let addr = listen
                    .parse()
                    .with_context(|| format!("invalid metrics listen address {:?}", listen))?;
                Ok(Some(addr))
            }
            _ => Ok(None),
        }
    }

    fn stats_interval(&self) -> Duration {
        self.refresh
            .stats
            .as_ref()
            .and_then(|s| s.interval)
            .unwrap_or(DEFAULT_STATS_INTERVAL)
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Resolve absolute path
        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        Self::from_yaml(&data).with_context(|| format!("load config from {:?}", abs_path))
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml(data: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(data).context("unmarshal yaml")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if let Some(d) = self.refresh.defaults.as_ref() {
            if let Some(pct) = d.jitter_pct {
                if !pct.is_finite() || !(0.0..1.0).contains(&pct) {
                    anyhow::bail!("defaults.jitter_pct must be within [0, 1), got {}", pct);
                }
            }
            if d.interval == Some(Duration::ZERO) {
                anyhow::bail!("defaults.interval must be positive");
            }
        }

        for (name, cache) in &self.refresh.caches {
            if cache.source.as_os_str().is_empty() {
                anyhow::bail!("cache {:?}: source is empty", name);
            }
            if cache.interval == Some(Duration::ZERO) {
                anyhow::bail!("cache {:?}: interval must be positive", name);
            }
        }

        if let Some(s) = self.refresh.stats.as_ref() {
            if s.interval == Some(Duration::ZERO) {
                anyhow::bail!("stats.interval must be positive");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test_config;
#[cfg(test)]
pub use test_config::new_test_config;
