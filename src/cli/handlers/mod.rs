//! Command handlers for CLI operations
//!
//! This module contains handlers for different CLI commands,
//! separating command execution logic from parsing and validation.

pub mod cache;
pub mod check;

pub use cache::CacheCommandHandler;
pub use check::CheckCommandHandler;
