//! Failure classification
//!
//! [`classify`] is a pure function from a failure and a policy to a
//! [`RetryDecision`]. Rules are evaluated in a fixed order and the first one
//! that matches decides:
//!
//! 1. the overloaded status is always retryable
//! 2. a `x-should-retry: true` header makes any HTTP failure retryable
//! 3. statuses in the retryable set are retryable
//! 4. any other 4xx status is a hard stop
//! 5. network failures are retryable when their code is in the retryable set
//!
//! Anything left over (unlisted 5xx, unknown network codes, malformed bodies
//! unless the policy opts in) is not retried.

use std::fmt;
use std::time::Duration;

use crate::types::RetryPolicy;

use super::failure::{Failure, FailureKind, ResponseHints};

/// Which classification rule produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassificationRule {
    /// Status equals the policy's overloaded status
    OverloadedStatus,
    /// Server sent the force-retry header
    ForceRetryHeader,
    /// Status is in the retryable set
    RetryableStatus,
    /// Unlisted 4xx status
    ClientErrorVeto,
    /// Status outside the 4xx range that is not listed
    NonRetryableStatus,
    /// Network code is in the retryable set
    RetryableNetworkError,
    /// Network code is not in the retryable set
    NonRetryableNetworkError,
    /// Unusable response body
    MalformedResponse,
}

impl ClassificationRule {
    /// Kebab-case name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationRule::OverloadedStatus => "overloaded-status",
            ClassificationRule::ForceRetryHeader => "force-retry-header",
            ClassificationRule::RetryableStatus => "retryable-status",
            ClassificationRule::ClientErrorVeto => "client-error-veto",
            ClassificationRule::NonRetryableStatus => "non-retryable-status",
            ClassificationRule::RetryableNetworkError => "retryable-network-error",
            ClassificationRule::NonRetryableNetworkError => "non-retryable-network-error",
            ClassificationRule::MalformedResponse => "malformed-response",
        }
    }
}

impl fmt::Display for ClassificationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The classifier's verdict for one failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryDecision {
    /// Whether another attempt may be made
    pub should_retry: bool,
    /// Human-readable reason
    pub reason: String,
    /// The rule that fired
    pub rule: ClassificationRule,
    /// Server-supplied wait that replaces the computed backoff
    ///
    /// Only ever set on retryable decisions.
    pub delay_override: Option<Duration>,
}

impl RetryDecision {
    fn retry(rule: ClassificationRule, reason: String, hints: Option<&ResponseHints>) -> Self {
        let delay_override = hints
            .and_then(ResponseHints::retry_after_secs)
            .map(|secs| Duration::from_millis(secs.saturating_mul(1000)));
        Self {
            should_retry: true,
            reason,
            rule,
            delay_override,
        }
    }

    fn stop(rule: ClassificationRule, reason: String) -> Self {
        Self {
            should_retry: false,
            reason,
            rule,
            delay_override: None,
        }
    }
}

/// Classify a failure against a policy
pub fn classify(failure: &Failure, policy: &RetryPolicy) -> RetryDecision {
    let decision = match failure.kind() {
        FailureKind::Http { status, hints } => classify_http(*status, hints, policy),
        FailureKind::Network { code } => {
            if policy.is_retryable_error_code(code) {
                RetryDecision::retry(
                    ClassificationRule::RetryableNetworkError,
                    format!("network error {} is transient", code),
                    None,
                )
            } else {
                RetryDecision::stop(
                    ClassificationRule::NonRetryableNetworkError,
                    format!("network error {} is not retryable", code),
                )
            }
        }
        FailureKind::MalformedResponse => {
            if policy.retry_malformed_responses {
                RetryDecision::retry(
                    ClassificationRule::MalformedResponse,
                    "malformed response, retrying by policy".to_string(),
                    None,
                )
            } else {
                RetryDecision::stop(
                    ClassificationRule::MalformedResponse,
                    "malformed response".to_string(),
                )
            }
        }
    };

    tracing::trace!(
        kind = failure.kind().label(),
        rule = %decision.rule,
        should_retry = decision.should_retry,
        "classified failure"
    );

    decision
}

fn classify_http(status: u16, hints: &ResponseHints, policy: &RetryPolicy) -> RetryDecision {
    if policy.is_overloaded(status) {
        return RetryDecision::retry(
            ClassificationRule::OverloadedStatus,
            format!("service overloaded (status {})", status),
            Some(hints),
        );
    }

    if hints.force_retry() {
        return RetryDecision::retry(
            ClassificationRule::ForceRetryHeader,
            format!("server requested retry for status {}", status),
            Some(hints),
        );
    }

    if policy.is_retryable_status(status) {
        return RetryDecision::retry(
            ClassificationRule::RetryableStatus,
            format!("status {} is transient", status),
            Some(hints),
        );
    }

    if (400..500).contains(&status) {
        return RetryDecision::stop(
            ClassificationRule::ClientErrorVeto,
            format!("client error {} is not retryable", status),
        );
    }

    RetryDecision::stop(
        ClassificationRule::NonRetryableStatus,
        format!("status {} is not retryable", status),
    )
}
