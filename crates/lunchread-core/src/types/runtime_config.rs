//! Runtime configuration types
//!
//! These types control how the generator talks to the Messages API, how hard
//! it retries, where generated articles land, and what happens in git afterwards.

use serde::{Deserialize, Serialize};

use super::retry_types::RetryPolicy;

/// Complete runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Messages API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry policy for content generation calls
    #[serde(default = "RetryPolicy::content_generation")]
    pub retry: RetryPolicy,

    /// Content file settings
    #[serde(default)]
    pub content: ContentConfig,

    /// Git workflow after a successful write
    #[serde(default)]
    pub git: GitWorkflowConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            retry: RetryPolicy::content_generation(),
            content: ContentConfig::default(),
            git: GitWorkflowConfig::default(),
        }
    }
}

/// Messages API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApiConfig {
    /// Base URL, without the `/messages` suffix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens per generated article
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Value of the `anthropic-version` header
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.anthropic.com/v1".to_string()
}
fn default_model() -> String {
    "claude-3-opus-20240229".to_string()
}
fn default_max_tokens() -> u32 {
    1500
}
fn default_api_version() -> String {
    "2023-06-01".to_string()
}
fn default_timeout() -> u64 {
    60
}
fn default_user_agent() -> String {
    format!(
        "lunchread/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Content file configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContentConfig {
    /// Path of the JS module holding the `lunchReads` object
    #[serde(default = "default_content_file")]
    pub file: String,

    /// Copy the file aside before modifying it
    #[serde(default = "default_true")]
    pub backup: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            file: default_content_file(),
            backup: true,
        }
    }
}

fn default_content_file() -> String {
    "src/content/lunchReads.js".to_string()
}

/// Git workflow configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitWorkflowConfig {
    /// Commit the content file after writing it
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Push after committing
    #[serde(default = "default_true")]
    pub push: bool,

    /// Remote to push to (git's default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,

    /// Commit message prefix; the lunch read id is appended
    #[serde(default = "default_commit_prefix")]
    pub commit_message_prefix: String,
}

impl Default for GitWorkflowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            push: true,
            remote: None,
            commit_message_prefix: default_commit_prefix(),
        }
    }
}

fn default_commit_prefix() -> String {
    "Add new lunch read".to_string()
}

fn default_true() -> bool {
    true
}
