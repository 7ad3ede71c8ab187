//! Retry execution engine
//!
//! The loop is strictly sequential: an attempt runs, its failure is
//! classified, and the executor either stops or sleeps and tries again. The
//! sleep is `tokio::time::sleep`, so waiting never blocks other tasks and a
//! paused test clock can fast-forward through it.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::types::RetryPolicy;

use super::classifier::{classify, ClassificationRule};
use super::delay::compute_delay;
use super::error::RetryError;
use super::failure::Failure;
use super::jitter::{JitterSource, NoJitter, RandomJitter};
use super::observer::{NoOpObserver, RetryObserver};

/// How an attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The operation returned a value
    Succeeded,
    /// The operation failed and was classified
    Failed {
        /// Rule that classified the failure
        rule: ClassificationRule,
        /// Whether the classifier allowed another attempt
        should_retry: bool,
    },
}

/// One execution of the operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    index: u32,
    started_at: Instant,
    elapsed: Duration,
    outcome: AttemptOutcome,
}

impl Attempt {
    pub fn new(
        index: u32,
        started_at: Instant,
        elapsed: Duration,
        outcome: AttemptOutcome,
    ) -> Self {
        Self {
            index,
            started_at,
            elapsed,
            outcome,
        }
    }

    /// 1-based attempt number
    pub fn index(&self) -> u32 {
        self.index
    }

    /// When the operation was invoked
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Time spent inside the operation
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn outcome(&self) -> AttemptOutcome {
        self.outcome
    }
}

/// Execute an async operation with the given policy
///
/// Uses random jitter and no observer. For logging or deterministic waits,
/// use [`RetryExecutorBuilder`].
///
/// # Example
///
/// ```rust,no_run
/// use lunchread_core::retry::{retry_with_policy, Failure};
/// use lunchread_core::types::RetryPolicy;
///
/// async fn example() {
///     let policy = RetryPolicy::default();
///
///     let result = retry_with_policy(&policy, || async {
///         Ok::<_, Failure>("success")
///     })
///     .await;
/// }
/// ```
pub async fn retry_with_policy<F, Fut, T>(policy: &RetryPolicy, op: F) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Failure>>,
{
    RetryExecutorBuilder::new()
        .with_policy(policy.clone())
        .build()
        .execute(op)
        .await
}

/// Builder for configuring a [`RetryExecutor`]
///
/// # Example
///
/// ```rust
/// use lunchread_core::retry::{RetryExecutorBuilder, TracingObserver};
/// use lunchread_core::types::RetryPolicy;
///
/// let executor = RetryExecutorBuilder::new()
///     .with_policy(RetryPolicy::content_generation())
///     .with_observer(TracingObserver::new("generate-en"))
///     .build();
/// ```
pub struct RetryExecutorBuilder<O = NoOpObserver, J = RandomJitter> {
    policy: RetryPolicy,
    observer: O,
    jitter: J,
}

impl Default for RetryExecutorBuilder<NoOpObserver, RandomJitter> {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutorBuilder<NoOpObserver, RandomJitter> {
    /// Create a new builder with the default policy and random jitter
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
            observer: NoOpObserver,
            jitter: RandomJitter::new(),
        }
    }
}

impl<O, J> RetryExecutorBuilder<O, J> {
    /// Set the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the observer
    pub fn with_observer<O2>(self, observer: O2) -> RetryExecutorBuilder<O2, J> {
        RetryExecutorBuilder {
            policy: self.policy,
            observer,
            jitter: self.jitter,
        }
    }

    /// Set the jitter source
    pub fn with_jitter<J2>(self, jitter: J2) -> RetryExecutorBuilder<O, J2> {
        RetryExecutorBuilder {
            policy: self.policy,
            observer: self.observer,
            jitter,
        }
    }

    /// Disable jitter
    pub fn without_jitter(self) -> RetryExecutorBuilder<O, NoJitter> {
        self.with_jitter(NoJitter)
    }

    /// Build the executor
    pub fn build(self) -> RetryExecutor<O, J> {
        RetryExecutor {
            policy: self.policy,
            observer: self.observer,
            jitter: self.jitter,
        }
    }
}

/// A retry executor with a fixed policy, observer and jitter source
///
/// Holds no per-invocation state, so one executor can drive several
/// concurrent invocations.
pub struct RetryExecutor<O = NoOpObserver, J = RandomJitter> {
    policy: RetryPolicy,
    observer: O,
    jitter: J,
}

impl<O, J> RetryExecutor<O, J>
where
    O: RetryObserver,
    J: JitterSource,
{
    /// The policy this executor runs with
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute an operation with retry logic
    ///
    /// Returns the first successful value, or the last failure once the
    /// classifier refuses a retry or the attempt budget is spent. No wait
    /// follows the final attempt.
    pub async fn execute<F, Fut, T>(&self, mut op: F) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
    {
        let start = Instant::now();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut history: Vec<Attempt> = Vec::new();
        let mut attempt = 1;

        loop {
            self.observer.on_attempt_start(attempt, max_attempts);
            let attempt_start = Instant::now();

            let failure = match op().await {
                Ok(value) => {
                    let record = Attempt::new(
                        attempt,
                        attempt_start,
                        attempt_start.elapsed(),
                        AttemptOutcome::Succeeded,
                    );
                    self.observer.on_success(&record, start.elapsed());
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            let decision = classify(&failure, &self.policy);
            let record = Attempt::new(
                attempt,
                attempt_start,
                attempt_start.elapsed(),
                AttemptOutcome::Failed {
                    rule: decision.rule,
                    should_retry: decision.should_retry,
                },
            );
            self.observer.on_attempt_failed(&record, &failure, &decision);
            history.push(record);

            if !decision.should_retry {
                self.observer.on_non_retryable(attempt, &failure, &decision);
                return Err(RetryError::NonRetryable {
                    attempt,
                    reason: decision.reason,
                    rule: decision.rule,
                    failure,
                    history,
                });
            }

            if attempt >= max_attempts {
                self.observer.on_exhausted(attempt, &failure);
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    reason: decision.reason,
                    rule: decision.rule,
                    failure,
                    total_duration: start.elapsed(),
                    history,
                });
            }

            let delay = compute_delay(attempt, &failure, &decision, &self.policy)
                .map(|plan| plan.with_jitter(&self.jitter, self.policy.jitter_max()))
                .unwrap_or_default();

            self.observer.on_retry_scheduled(attempt, delay);

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::failure::ResponseHints;
    use crate::retry::observer::StatsObserver;
    use crate::types::NetworkErrorCode;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn test_policy() -> RetryPolicy {
        RetryPolicy::default().with_base_delay(Duration::from_millis(10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success() {
        let observer = Arc::new(StatsObserver::new());

        let result = RetryExecutorBuilder::new()
            .with_policy(test_policy())
            .with_observer(observer.clone())
            .build()
            .execute(|| async { Ok::<_, Failure>("success") })
            .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(observer.attempt_starts(), 1);
        assert_eq!(observer.successes(), 1);
        assert_eq!(observer.failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_retry() {
        let observer = Arc::new(StatsObserver::new());
        let calls = Arc::new(AtomicU32::new(0));

        let result = RetryExecutorBuilder::new()
            .with_policy(test_policy())
            .with_observer(observer.clone())
            .without_jitter()
            .build()
            .execute(|| {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(Failure::network(NetworkErrorCode::TimedOut, "timeout"))
                    } else {
                        Ok("success")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(observer.failures(), 1);
        assert_eq!(observer.delays(), vec![Duration::from_millis(10)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_keeps_history() {
        let observer = Arc::new(StatsObserver::new());

        let err = RetryExecutorBuilder::new()
            .with_policy(test_policy())
            .with_observer(observer.clone())
            .without_jitter()
            .build()
            .execute(|| async {
                Err::<(), _>(Failure::http(503, ResponseHints::default(), "unavailable"))
            })
            .await
            .unwrap_err();

        assert!(err.is_exhausted());
        assert_eq!(err.attempts(), 3);
        assert_eq!(err.history().len(), 3);
        assert_eq!(
            err.history().iter().map(Attempt::index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(observer.exhaustions(), 1);
        // Two waits, none after the last attempt
        assert_eq!(
            observer.delays(),
            vec![Duration::from_millis(10), Duration::from_millis(20)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_max_attempts_runs_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..test_policy()
        };
        let calls = Arc::new(AtomicU32::new(0));

        let err = retry_with_policy(&policy, || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Failure::network(NetworkErrorCode::ConnectionReset, "reset"))
            }
        })
        .await
        .unwrap_err();

        assert!(err.is_exhausted());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_executor_runs_concurrently() {
        let executor = RetryExecutorBuilder::new()
            .with_policy(test_policy())
            .without_jitter()
            .build();
        let first = Arc::new(AtomicU32::new(0));
        let second = Arc::new(AtomicU32::new(0));

        let (a, b) = tokio::join!(
            executor.execute(|| {
                let calls = first.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(Failure::network(NetworkErrorCode::Aborted, "aborted"))
                    } else {
                        Ok("en")
                    }
                }
            }),
            executor.execute(|| {
                let calls = second.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<&str, _>(Failure::http(401, ResponseHints::default(), "bad key"))
                }
            }),
        );

        assert_eq!(a.unwrap(), "en");
        assert_eq!(first.load(Ordering::SeqCst), 3);
        assert!(b.unwrap_err().is_non_retryable());
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}
