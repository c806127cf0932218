//! Named caches refreshed in the background.
//!
//! A [`CacheRegistry`] owns one [`Cache`] per key. Each cache runs its
//! refresher immediately on start and then on a jittered interval,
//! publishing every successful result as an immutable snapshot. Faults go
//! to the cache's error handler, else the registry default, else the log.

pub mod cache;
pub mod config;
pub mod metrics;
pub mod refresh;
pub mod registry;
pub mod source;
pub mod telemetry;

#[cfg(test)]
mod tests;

#[cfg(test)]
pub use tests::support;

pub use cache::{Cache, CacheStats, ConfigurationError, ReadError, RunState};
pub use refresh::{
    BlockingRefresher, ErrorHandler, Lookup, RefreshFault, Refresher, SchedulePlan, Tunables,
};
pub use registry::{CacheRegistry, RegistryError};
pub use source::FileSource;
