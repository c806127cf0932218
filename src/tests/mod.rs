//! End-to-end refresh scenarios.
//!
//! These tests drive caches through the registry the way an application
//! would and check the resilience guarantees of the refresh engine.


pub mod support;
