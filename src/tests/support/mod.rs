// Shared test support code.

pub mod common;
pub mod logs;

pub use common::*;
pub use logs::LogCapture;
