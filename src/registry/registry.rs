//! Keyed collection of caches with bulk lifecycle operations.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, info};

use super::error::RegistryError;
use crate::cache::{Cache, CacheStats};
use crate::refresh::observer::empty_slot;
use crate::refresh::{ErrorHandler, HandlerSlot, Tunables};

struct Inner<K, V> {
    caches: HashMap<K, Cache<V>>,
    closed: bool,
    started_pid: Option<u32>,
}

/// Registry of named caches.
///
/// Construct one per process (or per subsystem) and share it by reference or
/// `Arc`. Dropping the registry and every cache handle stops all scheduling;
/// `stop_all` does it explicitly.
pub struct CacheRegistry<K, V> {
    tunables: Tunables,
    default_handler: HandlerSlot,
    inner: RwLock<Inner<K, V>>,
    process_id: Box<dyn Fn() -> u32 + Send + Sync>,
}

impl<K, V> Default for CacheRegistry<K, V>
where
    K: Eq + Hash + Clone + Display,
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> CacheRegistry<K, V>
where
    K: Eq + Hash + Clone + Display,
    V: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_tunables(Tunables::default())
    }

    pub fn with_tunables(tunables: Tunables) -> Self {
        Self {
            tunables,
            default_handler: empty_slot(),
            inner: RwLock::new(Inner {
                caches: HashMap::new(),
                closed: false,
                started_pid: None,
            }),
            process_id: Box::new(std::process::id),
        }
    }

    /// Replaces the source of the process identity used for fork detection.
    #[cfg(test)]
    pub(crate) fn with_process_id<F>(mut self, f: F) -> Self
    where
        F: Fn() -> u32 + Send + Sync + 'static,
    {
        self.process_id = Box::new(f);
        self
    }

    pub fn tunables(&self) -> Tunables {
        self.tunables
    }

    /// Returns the cache for `key`, creating it with the default interval
    /// and no refresher. New keys are rejected once the registry is closed.
    pub fn get_or_create(&self, key: K) -> Result<Cache<V>, RegistryError> {
        if let Some(cache) = self.inner.read().caches.get(&key) {
            return Ok(cache.clone());
        }

        let mut inner = self.inner.write();
        if let Some(cache) = inner.caches.get(&key) {
            return Ok(cache.clone());
        }
        if inner.closed {
            return Err(RegistryError::Closed {
                key: key.to_string(),
            });
        }

        let cache = Cache::with_parts(
            key.to_string(),
            self.tunables,
            Arc::clone(&self.default_handler),
        );
        inner.caches.insert(key, cache.clone());
        debug!(component = "registry", cache = %cache.key(), event = "created", "cache registered");
        Ok(cache)
    }

    pub fn get(&self, key: &K) -> Option<Cache<V>> {
        self.inner.read().caches.get(key).cloned()
    }

    pub fn keys(&self) -> Vec<K> {
        self.inner.read().caches.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().caches.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.read().closed
    }

    /// Handler for faults of caches without their own handler.
    pub fn set_default_error_handler(&self, handler: ErrorHandler) {
        self.default_handler.store(Some(Arc::new(handler)));
    }

    pub fn clear_default_error_handler(&self) {
        self.default_handler.store(None);
    }

    fn entries(&self) -> Vec<(K, Cache<V>)> {
        self.inner
            .read()
            .caches
            .iter()
            .map(|(k, c)| (k.clone(), c.clone()))
            .collect()
    }

    /// Closes the registry and starts every cache. Nothing is started if any
    /// cache is misconfigured. Returns whether every scheduler is running.
    pub fn start_all(&self) -> Result<bool, RegistryError> {
        let current_pid = (self.process_id)();

        let caches = {
            let mut inner = self.inner.write();
            if let Some(started_pid) = inner.started_pid {
                if started_pid != current_pid {
                    return Err(RegistryError::ForkMisuse {
                        started_pid,
                        current_pid,
                    });
                }
            }
            inner.closed = true;
            inner
                .caches
                .iter()
                .map(|(k, c)| (k.clone(), c.clone()))
                .collect::<Vec<_>>()
        };

        for (key, cache) in &caches {
            cache.validate().map_err(|source| RegistryError::Configuration {
                key: key.to_string(),
                source,
            })?;
        }

        let mut all_running = true;
        for (key, cache) in &caches {
            let running = cache.start().map_err(|source| RegistryError::Configuration {
                key: key.to_string(),
                source,
            })?;
            all_running &= running;
        }

        self.inner.write().started_pid.get_or_insert(current_pid);

        info!(
            component = "registry",
            event = "started",
            caches = caches.len(),
            all_running,
            "caches started"
        );
        Ok(all_running)
    }

    /// Stops every cache. Snapshots are retained.
    pub fn stop_all(&self) {
        let caches = self.entries();
        for (_, cache) in &caches {
            cache.stop();
        }
        info!(component = "registry", event = "stopped", caches = caches.len(), "caches stopped");
    }

    /// Stops and starts every cache, forcing an immediate refresh of each.
    pub fn restart_all(&self) -> Result<bool, RegistryError> {
        self.stop_all();
        self.start_all()
    }

    pub fn stats(&self) -> Vec<(K, CacheStats)> {
        self.entries()
            .into_iter()
            .map(|(k, c)| (k, c.stats()))
            .collect()
    }
}
