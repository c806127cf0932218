// Package registry provides the keyed cache collection.

pub mod error;
pub mod registry;


// Re-export main types
pub use error::RegistryError;
pub use registry::CacheRegistry;
