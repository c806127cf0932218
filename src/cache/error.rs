use std::time::Duration;

/// Raised by `start` before anything is scheduled.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("cache `{key}` has no refresher; set one with `set_refresher` before starting")]
    MissingRefresher { key: String },
    #[error("cache `{key}` refresh interval must be a positive finite number of seconds, got {secs}")]
    InvalidInterval { key: String, secs: f64 },
    #[error("cache `{key}` must be started from within a tokio runtime")]
    NoRuntime { key: String },
}

/// Read-path conditions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    #[error("cache `{key}` accessed before start; start it before reading")]
    NotStarted { key: String },
    #[error("cache `{key}` accessed before initial load; allow more time for the first refresh")]
    NotYetLoaded { key: String },
    #[error("cache `{key}` was not loaded within {waited:?}")]
    LoadTimeout { key: String, waited: Duration },
}
