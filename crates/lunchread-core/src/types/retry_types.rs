//! Retry policy types
//!
//! A [`RetryPolicy`] is immutable configuration for one executor invocation:
//! the attempt budget, the base delay, which failures count as transient, and
//! per-status tuning for statuses that need a gentler backoff.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Network-level failure codes recognised by the classifier
///
/// Parses both the kebab-case names used in configuration files and the
/// errno-style spellings (`ECONNRESET`, ...) that HTTP stacks commonly report.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NetworkErrorCode {
    /// The peer reset the connection
    ConnectionReset,
    /// The request or connection timed out
    TimedOut,
    /// The connection was aborted locally
    Aborted,
    /// The remote host refused the connection
    ConnectionRefused,
    /// Any other code, kept verbatim
    Other(String),
}

impl NetworkErrorCode {
    /// Canonical kebab-case name
    pub fn as_str(&self) -> &str {
        match self {
            NetworkErrorCode::ConnectionReset => "connection-reset",
            NetworkErrorCode::TimedOut => "timed-out",
            NetworkErrorCode::Aborted => "aborted",
            NetworkErrorCode::ConnectionRefused => "connection-refused",
            NetworkErrorCode::Other(code) => code,
        }
    }

    /// Map an I/O error kind onto a network error code
    pub fn from_io_kind(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::ConnectionReset => NetworkErrorCode::ConnectionReset,
            io::ErrorKind::TimedOut => NetworkErrorCode::TimedOut,
            io::ErrorKind::ConnectionAborted => NetworkErrorCode::Aborted,
            io::ErrorKind::ConnectionRefused => NetworkErrorCode::ConnectionRefused,
            other => NetworkErrorCode::Other(format!("{:?}", other).to_lowercase()),
        }
    }

    /// The default set of transient network codes
    pub fn default_retryable() -> BTreeSet<NetworkErrorCode> {
        [
            NetworkErrorCode::ConnectionReset,
            NetworkErrorCode::TimedOut,
            NetworkErrorCode::Aborted,
            NetworkErrorCode::ConnectionRefused,
        ]
        .into_iter()
        .collect()
    }
}

impl FromStr for NetworkErrorCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let code = match s.trim().to_ascii_lowercase().as_str() {
            "connection-reset" | "econnreset" => NetworkErrorCode::ConnectionReset,
            "timed-out" | "etimedout" => NetworkErrorCode::TimedOut,
            "aborted" | "econnaborted" => NetworkErrorCode::Aborted,
            "connection-refused" | "econnrefused" => NetworkErrorCode::ConnectionRefused,
            _ => NetworkErrorCode::Other(s.trim().to_string()),
        };
        Ok(code)
    }
}

impl From<String> for NetworkErrorCode {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(code) => code,
            Err(never) => match never {},
        }
    }
}

impl From<NetworkErrorCode> for String {
    fn from(value: NetworkErrorCode) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for NetworkErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-status tuning applied by the delay calculator
///
/// Every field is optional; an absent field falls back to the policy-wide value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StatusOverride {
    /// Base delay used instead of the policy's base delay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_delay_ms: Option<u64>,

    /// Backoff multiplier used instead of the policy's multiplier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_multiplier: Option<f64>,

    /// Upper bound on the computed delay (before the overloaded floor)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,
}

/// Retry policy for one executor invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay in milliseconds
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Backoff multiplier used when no per-status override sets one
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// HTTP statuses treated as transient
    #[serde(default = "default_retryable_status_codes")]
    pub retryable_status_codes: BTreeSet<u16>,

    /// Network error codes treated as transient
    #[serde(default = "NetworkErrorCode::default_retryable")]
    pub retryable_error_codes: BTreeSet<NetworkErrorCode>,

    /// Status signalling that the remote service is over capacity
    #[serde(default = "default_overloaded_status")]
    pub overloaded_status_code: u16,

    /// Minimum wait after an overloaded response, in milliseconds
    #[serde(default = "default_overloaded_min_delay")]
    pub overloaded_min_delay_ms: u64,

    /// Per-status delay tuning
    #[serde(default)]
    pub per_status_overrides: BTreeMap<u16, StatusOverride>,

    /// Upper bound (exclusive) of the random jitter added to every wait
    #[serde(default = "default_jitter_max")]
    pub jitter_max_ms: u64,

    /// Whether a 2xx response with an unusable body is retried
    #[serde(default)]
    pub retry_malformed_responses: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            retryable_status_codes: default_retryable_status_codes(),
            retryable_error_codes: NetworkErrorCode::default_retryable(),
            overloaded_status_code: default_overloaded_status(),
            overloaded_min_delay_ms: default_overloaded_min_delay(),
            per_status_overrides: BTreeMap::new(),
            jitter_max_ms: default_jitter_max(),
            retry_malformed_responses: false,
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay() -> u64 {
    2000
}
fn default_backoff_multiplier() -> f64 {
    crate::retry::DEFAULT_BACKOFF_MULTIPLIER
}
fn default_retryable_status_codes() -> BTreeSet<u16> {
    [408, 429, 500, 502, 503, 504, 529].into_iter().collect()
}
fn default_overloaded_status() -> u16 {
    529
}
fn default_overloaded_min_delay() -> u64 {
    5000
}
fn default_jitter_max() -> u64 {
    500
}

impl RetryPolicy {
    /// Policy tuned for long-running content generation calls
    ///
    /// Five attempts, and a slower, capped backoff for the overloaded status.
    pub fn content_generation() -> Self {
        let overloaded = default_overloaded_status();
        Self {
            max_attempts: 5,
            ..Self::default()
        }
        .with_status_override(
            overloaded,
            StatusOverride {
                initial_delay_ms: Some(5000),
                backoff_multiplier: Some(2.5),
                max_delay_ms: Some(30000),
            },
        )
    }

    /// Set the attempt budget
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the base delay
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay_ms = delay.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    /// Add or replace a per-status override
    pub fn with_status_override(mut self, status: u16, status_override: StatusOverride) -> Self {
        self.per_status_overrides.insert(status, status_override);
        self
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::invalid_policy("max-attempts must be at least 1"));
        }
        check_multiplier("backoff-multiplier", self.backoff_multiplier)?;

        for (status, status_override) in &self.per_status_overrides {
            if let Some(multiplier) = status_override.backoff_multiplier {
                check_multiplier(&format!("per-status-overrides.{}", status), multiplier)?;
            }
            if !(100..=599).contains(status) {
                return Err(Error::invalid_policy(format!(
                    "per-status-overrides key {} is not an HTTP status",
                    status
                )));
            }
        }

        Ok(())
    }

    /// Whether the status is in the retryable set
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_status_codes.contains(&status)
    }

    /// Whether the network code is in the retryable set
    pub fn is_retryable_error_code(&self, code: &NetworkErrorCode) -> bool {
        self.retryable_error_codes.contains(code)
    }

    /// Whether the status is the distinguished overloaded status
    pub fn is_overloaded(&self, status: u16) -> bool {
        status == self.overloaded_status_code
    }

    /// Per-status override for the given status, if any
    pub fn override_for(&self, status: u16) -> Option<&StatusOverride> {
        self.per_status_overrides.get(&status)
    }

    /// Base delay as a duration
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Overloaded floor as a duration
    pub fn overloaded_min_delay(&self) -> Duration {
        Duration::from_millis(self.overloaded_min_delay_ms)
    }

    /// Jitter upper bound as a duration
    pub fn jitter_max(&self) -> Duration {
        Duration::from_millis(self.jitter_max_ms)
    }
}

fn check_multiplier(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 1.0 {
        return Err(Error::invalid_policy(format!(
            "{} must be a finite number >= 1.0 (got {})",
            field, value
        )));
    }
    Ok(())
}
