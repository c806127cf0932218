use crate::cache::ConfigurationError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// The registry was bulk-started and no longer accepts new keys.
    #[error("registry is closed; cache `{key}` must be registered before start_all")]
    Closed { key: String },
    /// Background tasks started before a fork do not exist in the child.
    #[error("start_all called from process {current_pid} but caches were started in process {started_pid}; start caches after forking")]
    ForkMisuse { started_pid: u32, current_pid: u32 },
    #[error("cache `{key}` is misconfigured: {source}")]
    Configuration {
        key: String,
        #[source]
        source: ConfigurationError,
    },
}
