// Main entrypoint for the refreshd daemon.

use anyhow::{Context, Result};
use clap::Parser;
use refresh_cache::config::{Config, ConfigTrait};
use refresh_cache::{metrics, telemetry, CacheRegistry, FileSource};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const CONFIG_PATH: &str = "cfg/refreshd.cfg.yaml";
const CONFIG_PATH_LOCAL: &str = "cfg/refreshd.cfg.local.yaml";

/// refreshd - keeps file-backed caches fresh in the background
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, value_name = "FILE")]
    cfg: Option<PathBuf>,
}

/// Loads the configuration struct from YAML file.
/// Tries local config first, then falls back to default config.
fn load_cfg(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    if let Some(custom_path) = path {
        let cfg = Config::load(&custom_path)
            .with_context(|| format!("failed to load custom config from {:?}", custom_path))?;
        return Ok((cfg, custom_path));
    }

    match Config::load(CONFIG_PATH_LOCAL) {
        Ok(cfg) => Ok((cfg, PathBuf::from(CONFIG_PATH_LOCAL))),
        Err(_) => {
            let cfg = Config::load(CONFIG_PATH)
                .with_context(|| format!("failed to load config from {}", CONFIG_PATH))?;
            Ok((cfg, PathBuf::from(CONFIG_PATH)))
        }
    }
}

/// Configures structured logging based on configuration.
fn configure_logger(cfg: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let log_level = cfg
        .logs()
        .and_then(|logs| logs.level.as_deref())
        .unwrap_or("info");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if cfg.is_prod() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    }
}

/// Registers one file-backed cache per configured entry.
fn build_registry(cfg: &Config) -> Result<Arc<CacheRegistry<String, Value>>> {
    let registry = Arc::new(CacheRegistry::with_tunables(cfg.tunables()));
    for (name, cache_cfg) in cfg.caches() {
        let cache = registry.get_or_create(name.clone())?;
        cache.set_refresher(FileSource::new(&cache_cfg.source));
        if let Some(interval) = cache_cfg.interval {
            cache.set_refresh_interval(interval);
        }
    }
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (cfg, path) = load_cfg(args.cfg)?;
    configure_logger(&cfg);
    info!(
        component = "config",
        event = "load_success",
        path = ?path,
        "config loaded"
    );

    if let Some(listen) = cfg.metrics_listen()? {
        match metrics::init_prometheus_exporter(listen) {
            Ok(()) => info!(
                component = "main",
                event = "metrics_started",
                listen = %listen,
                "prometheus exporter listening"
            ),
            Err(e) => error!(
                component = "main",
                event = "metrics_failed",
                error = %e,
                "metrics endpoint will not be available"
            ),
        }
    }

    let registry = build_registry(&cfg)?;
    registry.start_all()?;

    let shutdown_token = CancellationToken::new();
    let stats_task = tokio::spawn(telemetry::logger(
        shutdown_token.clone(),
        Arc::clone(&registry),
        cfg.stats_interval(),
    ));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!(component = "main", event = "shutdown", "shutting down");

    registry.stop_all();
    shutdown_token.cancel();
    if let Err(e) = stats_task.await {
        error!(
            component = "main",
            event = "stats_logger_failed",
            error = %e,
            "stats logger exited abnormally"
        );
    }

    Ok(())
}
