//! Error types for the retry executor
//!
//! Both variants carry the failure from the last attempt together with the
//! classifier's reason, so callers can log or branch on the final outcome
//! without re-classifying.

use std::time::Duration;

use super::classifier::ClassificationRule;
use super::executor::Attempt;
use super::failure::Failure;

/// Terminal failure of one executor invocation
#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    /// The classifier refused to retry; no further attempts were made
    #[error("non-retryable failure on attempt {attempt} ({reason}): {failure}")]
    NonRetryable {
        /// The attempt that failed (1-based)
        attempt: u32,
        /// Classifier reason
        reason: String,
        /// Rule that stopped the loop
        rule: ClassificationRule,
        /// The failure itself
        #[source]
        failure: Failure,
        /// Every attempt made, in order
        history: Vec<Attempt>,
    },

    /// Every permitted attempt failed with a retryable failure
    #[error(
        "retry exhausted after {attempts} attempts over {:.2}s ({reason}): {failure}",
        .total_duration.as_secs_f64()
    )]
    Exhausted {
        /// Number of attempts made
        attempts: u32,
        /// Classifier reason for the last failure
        reason: String,
        /// Rule that classified the last failure
        rule: ClassificationRule,
        /// The failure from the final attempt
        #[source]
        failure: Failure,
        /// Wall time across all attempts and waits
        total_duration: Duration,
        /// Every attempt made, in order
        history: Vec<Attempt>,
    },
}

impl RetryError {
    /// Number of attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::NonRetryable { attempt, .. } => *attempt,
            RetryError::Exhausted { attempts, .. } => *attempts,
        }
    }

    /// The last failure
    pub fn failure(&self) -> &Failure {
        match self {
            RetryError::NonRetryable { failure, .. } | RetryError::Exhausted { failure, .. } => {
                failure
            }
        }
    }

    /// Classifier reason for the last failure
    pub fn reason(&self) -> &str {
        match self {
            RetryError::NonRetryable { reason, .. } | RetryError::Exhausted { reason, .. } => {
                reason
            }
        }
    }

    /// Rule that classified the last failure
    pub fn rule(&self) -> ClassificationRule {
        match self {
            RetryError::NonRetryable { rule, .. } | RetryError::Exhausted { rule, .. } => *rule,
        }
    }

    /// Every attempt made, in order
    pub fn history(&self) -> &[Attempt] {
        match self {
            RetryError::NonRetryable { history, .. } | RetryError::Exhausted { history, .. } => {
                history
            }
        }
    }

    /// Check if all attempts were used up
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    /// Check if the loop stopped on a non-retryable failure
    pub fn is_non_retryable(&self) -> bool {
        matches!(self, RetryError::NonRetryable { .. })
    }

    /// Take the last failure, consuming this error
    pub fn into_failure(self) -> Failure {
        match self {
            RetryError::NonRetryable { failure, .. } | RetryError::Exhausted { failure, .. } => {
                failure
            }
        }
    }
}
