// Package cache provides a single background-refreshed snapshot.

pub mod cache;
pub mod error;
mod publisher;


// Re-export main types
pub use cache::{Cache, CacheStats, RunState};
pub use error::{ConfigurationError, ReadError};
