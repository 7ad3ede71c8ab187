//! Resilient remote-call executor
//!
//! Wraps an async operation that fails with a [`Failure`] in bounded retry:
//!
//! - [`classify`] decides whether a failure is transient
//! - [`compute_delay`] decides how long to wait
//! - [`RetryExecutor`] drives the loop and reports to a [`RetryObserver`]
//!
//! # Example
//!
//! ```rust,no_run
//! use lunchread_core::retry::{retry_with_policy, Failure, RetryError};
//! use lunchread_core::types::RetryPolicy;
//!
//! async fn example() -> Result<String, RetryError> {
//!     let policy = RetryPolicy::content_generation();
//!
//!     retry_with_policy(&policy, || async {
//!         // Your remote call here
//!         Ok::<_, Failure>("article".to_string())
//!     })
//!     .await
//! }
//! ```

mod classifier;
mod delay;
mod error;
mod executor;
mod failure;
mod jitter;
mod observer;

pub use classifier::{classify, ClassificationRule, RetryDecision};
pub use delay::{compute_delay, DelayPlan, DEFAULT_BACKOFF_MULTIPLIER};
pub use error::RetryError;
pub use executor::{retry_with_policy, Attempt, AttemptOutcome, RetryExecutor, RetryExecutorBuilder};
pub use failure::{Failure, FailureKind, ResponseHints, FORCE_RETRY_HEADER, RETRY_AFTER_HEADER};
pub use jitter::{FixedJitter, JitterSource, NoJitter, RandomJitter};
pub use observer::{NoOpObserver, RetryObserver, StatsObserver, TracingObserver};

#[cfg(test)]
mod tests;
