//! Utility functions and helpers.
//!
//! Environment variable lookup and atomic file writes.

pub mod env;
pub mod fs;

pub use env::get_env_with_prefix;
pub use fs::write_atomic;
