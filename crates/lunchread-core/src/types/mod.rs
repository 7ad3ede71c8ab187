//! Type definitions for retry policies and runtime configuration

mod retry_types;
mod runtime_config;

pub use retry_types::{NetworkErrorCode, RetryPolicy, StatusOverride};
pub use runtime_config::{ApiConfig, ContentConfig, GitWorkflowConfig, RuntimeConfig};
