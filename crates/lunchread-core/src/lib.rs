//! # lunchread-core
//!
//! Core library for the lunch read generator providing:
//! - A resilient remote-call executor (failure classification, backoff, jitter)
//! - Retry policy types with per-status overrides
//! - Runtime configuration types and the hierarchical configuration loader

pub mod config;
pub mod error;
pub mod retry;
pub mod types;
pub mod utils;

pub use config::HierarchicalConfigLoader;
pub use error::{Error, Result};
pub use utils::config_dir;
