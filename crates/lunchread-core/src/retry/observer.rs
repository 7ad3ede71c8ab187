//! Retry observation and logging
//!
//! The executor reports every state transition to a [`RetryObserver`]. The
//! built-in [`TracingObserver`] turns those into `tracing` events; the
//! [`StatsObserver`] records them for assertions.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::classifier::{ClassificationRule, RetryDecision};
use super::executor::Attempt;
use super::failure::{Failure, FailureKind};

/// Observer trait for retry loop events
///
/// # Example
///
/// ```rust
/// use lunchread_core::retry::{Attempt, Failure, RetryDecision, RetryObserver};
/// use std::time::Duration;
///
/// struct Counter;
///
/// impl RetryObserver for Counter {
///     fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {}
///     fn on_attempt_failed(&self, attempt: &Attempt, failure: &Failure, decision: &RetryDecision) {}
///     fn on_success(&self, attempt: &Attempt, total_duration: Duration) {}
///     fn on_exhausted(&self, attempts: u32, failure: &Failure) {}
/// }
/// ```
pub trait RetryObserver: Send + Sync {
    /// Called before the operation is invoked
    ///
    /// * `attempt` - The attempt number (1-indexed)
    /// * `max_attempts` - The attempt budget
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32);

    /// Called once a failed attempt has been classified
    fn on_attempt_failed(&self, attempt: &Attempt, failure: &Failure, decision: &RetryDecision);

    /// Called when the executor is about to wait before the next attempt
    ///
    /// `delay` includes jitter.
    fn on_retry_scheduled(&self, attempt: u32, delay: Duration) {
        let _ = (attempt, delay);
    }

    /// Called when the operation succeeds
    fn on_success(&self, attempt: &Attempt, total_duration: Duration);

    /// Called when the final permitted attempt failed with a retryable failure
    fn on_exhausted(&self, attempts: u32, failure: &Failure);

    /// Called when the classifier stops the loop early
    fn on_non_retryable(&self, attempt: u32, failure: &Failure, decision: &RetryDecision) {
        let _ = (attempt, failure, decision);
    }
}

/// A no-op observer
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {}

    fn on_attempt_failed(&self, _attempt: &Attempt, _failure: &Failure, _decision: &RetryDecision) {
    }

    fn on_success(&self, _attempt: &Attempt, _total_duration: Duration) {}

    fn on_exhausted(&self, _attempts: u32, _failure: &Failure) {}
}

/// An observer that logs retry events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_attempt_start`: DEBUG
/// - `on_attempt_failed`: WARN when retryable, DEBUG otherwise
/// - `on_retry_scheduled`: INFO
/// - `on_success`: INFO (if > 1 attempt) or DEBUG (first attempt)
/// - `on_exhausted`: ERROR
/// - `on_non_retryable`: ERROR
#[derive(Debug, Clone)]
pub struct TracingObserver {
    operation: String,
}

impl TracingObserver {
    /// Create a new tracing observer for a named operation
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    /// Get the operation name
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("retry")
    }
}

impl RetryObserver for TracingObserver {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        tracing::debug!(
            operation = %self.operation,
            attempt = attempt,
            max_attempts = max_attempts,
            "starting attempt"
        );
    }

    fn on_attempt_failed(&self, attempt: &Attempt, failure: &Failure, decision: &RetryDecision) {
        let detail = match failure.kind() {
            FailureKind::Http { status, .. } => format!("status {}", status),
            FailureKind::Network { code } => format!("code {}", code),
            FailureKind::MalformedResponse => "malformed response".to_string(),
        };

        if decision.should_retry {
            tracing::warn!(
                operation = %self.operation,
                attempt = attempt.index(),
                elapsed_ms = attempt.elapsed().as_millis() as u64,
                failure = %detail,
                rule = %decision.rule,
                error = %failure,
                "attempt failed"
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                attempt = attempt.index(),
                failure = %detail,
                rule = %decision.rule,
                "attempt failed"
            );
        }
    }

    fn on_retry_scheduled(&self, attempt: u32, delay: Duration) {
        tracing::info!(
            operation = %self.operation,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            "retrying after delay"
        );
    }

    fn on_success(&self, attempt: &Attempt, total_duration: Duration) {
        if attempt.index() > 1 {
            tracing::info!(
                operation = %self.operation,
                attempt = attempt.index(),
                total_duration_ms = total_duration.as_millis() as u64,
                "succeeded after retry"
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                duration_ms = total_duration.as_millis() as u64,
                "succeeded on first attempt"
            );
        }
    }

    fn on_exhausted(&self, attempts: u32, failure: &Failure) {
        tracing::error!(
            operation = %self.operation,
            attempts = attempts,
            error = %failure,
            "all retry attempts exhausted"
        );
    }

    fn on_non_retryable(&self, attempt: u32, failure: &Failure, decision: &RetryDecision) {
        tracing::error!(
            operation = %self.operation,
            attempt = attempt,
            reason = %decision.reason,
            error = %failure,
            "non-retryable failure"
        );
    }
}

/// An observer that records what the executor did
///
/// Useful for tests and for summarising a run.
#[derive(Debug, Default)]
pub struct StatsObserver {
    attempt_starts: AtomicU32,
    failures: AtomicU32,
    successes: AtomicU32,
    exhaustions: AtomicU32,
    non_retryable: AtomicU32,
    delays: Mutex<Vec<Duration>>,
    rules: Mutex<Vec<ClassificationRule>>,
    attempts: Mutex<Vec<Attempt>>,
}

impl StatsObserver {
    /// Create a new stats observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attempts started
    pub fn attempt_starts(&self) -> u32 {
        self.attempt_starts.load(Ordering::SeqCst)
    }

    /// Number of failed attempts (retryable or not)
    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    /// Number of successes
    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    /// Number of exhaustions
    pub fn exhaustions(&self) -> u32 {
        self.exhaustions.load(Ordering::SeqCst)
    }

    /// Number of early stops
    pub fn non_retryable(&self) -> u32 {
        self.non_retryable.load(Ordering::SeqCst)
    }

    /// Scheduled waits, in order, jitter included
    pub fn delays(&self) -> Vec<Duration> {
        lock(&self.delays).clone()
    }

    /// Rules that classified each failure, in order
    pub fn rules(&self) -> Vec<ClassificationRule> {
        lock(&self.rules).clone()
    }

    /// Every finished attempt, successful or not, in order
    pub fn attempts(&self) -> Vec<Attempt> {
        lock(&self.attempts).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RetryObserver for StatsObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {
        self.attempt_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_attempt_failed(&self, attempt: &Attempt, _failure: &Failure, decision: &RetryDecision) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        lock(&self.rules).push(decision.rule);
        lock(&self.attempts).push(*attempt);
    }

    fn on_retry_scheduled(&self, _attempt: u32, delay: Duration) {
        lock(&self.delays).push(delay);
    }

    fn on_success(&self, attempt: &Attempt, _total_duration: Duration) {
        self.successes.fetch_add(1, Ordering::SeqCst);
        lock(&self.attempts).push(*attempt);
    }

    fn on_exhausted(&self, _attempts: u32, _failure: &Failure) {
        self.exhaustions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_non_retryable(&self, _attempt: u32, _failure: &Failure, _decision: &RetryDecision) {
        self.non_retryable.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: RetryObserver + ?Sized> RetryObserver for Arc<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_attempt_failed(&self, attempt: &Attempt, failure: &Failure, decision: &RetryDecision) {
        (**self).on_attempt_failed(attempt, failure, decision)
    }

    fn on_retry_scheduled(&self, attempt: u32, delay: Duration) {
        (**self).on_retry_scheduled(attempt, delay)
    }

    fn on_success(&self, attempt: &Attempt, total_duration: Duration) {
        (**self).on_success(attempt, total_duration)
    }

    fn on_exhausted(&self, attempts: u32, failure: &Failure) {
        (**self).on_exhausted(attempts, failure)
    }

    fn on_non_retryable(&self, attempt: u32, failure: &Failure, decision: &RetryDecision) {
        (**self).on_non_retryable(attempt, failure, decision)
    }
}

impl<T: RetryObserver + ?Sized> RetryObserver for Box<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_attempt_failed(&self, attempt: &Attempt, failure: &Failure, decision: &RetryDecision) {
        (**self).on_attempt_failed(attempt, failure, decision)
    }

    fn on_retry_scheduled(&self, attempt: u32, delay: Duration) {
        (**self).on_retry_scheduled(attempt, delay)
    }

    fn on_success(&self, attempt: &Attempt, total_duration: Duration) {
        (**self).on_success(attempt, total_duration)
    }

    fn on_exhausted(&self, attempts: u32, failure: &Failure) {
        (**self).on_exhausted(attempts, failure)
    }

    fn on_non_retryable(&self, attempt: u32, failure: &Failure, decision: &RetryDecision) {
        (**self).on_non_retryable(attempt, failure, decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::classifier::classify;
    use crate::retry::executor::AttemptOutcome;
    use crate::retry::failure::ResponseHints;
    use crate::types::RetryPolicy;
    use tokio::time::Instant;

    fn failed_attempt(index: u32, decision: &RetryDecision) -> Attempt {
        Attempt::new(
            index,
            Instant::now(),
            Duration::from_millis(10),
            AttemptOutcome::Failed {
                rule: decision.rule,
                should_retry: decision.should_retry,
            },
        )
    }

    #[test]
    fn test_stats_observer_records_rules_and_delays() {
        let observer = StatsObserver::new();
        let failure = Failure::http(503, ResponseHints::default(), "unavailable");
        let decision = classify(&failure, &RetryPolicy::default());

        observer.on_attempt_start(1, 3);
        observer.on_attempt_failed(&failed_attempt(1, &decision), &failure, &decision);
        observer.on_retry_scheduled(1, Duration::from_millis(2100));
        observer.on_attempt_start(2, 3);
        let succeeded = Attempt::new(
            2,
            Instant::now(),
            Duration::from_millis(5),
            AttemptOutcome::Succeeded,
        );
        observer.on_success(&succeeded, Duration::from_millis(2200));

        assert_eq!(observer.attempt_starts(), 2);
        assert_eq!(observer.failures(), 1);
        assert_eq!(observer.successes(), 1);
        assert_eq!(observer.exhaustions(), 0);
        assert_eq!(observer.delays(), vec![Duration::from_millis(2100)]);
        assert_eq!(observer.rules(), vec![ClassificationRule::RetryableStatus]);
        assert_eq!(
            observer
                .attempts()
                .iter()
                .map(Attempt::outcome)
                .collect::<Vec<_>>(),
            vec![
                AttemptOutcome::Failed {
                    rule: ClassificationRule::RetryableStatus,
                    should_retry: true,
                },
                AttemptOutcome::Succeeded,
            ]
        );
    }

    #[test]
    fn test_shared_observer_through_arc() {
        let observer = Arc::new(StatsObserver::new());
        let boxed: Box<dyn RetryObserver> = Box::new(observer.clone());
        let failure = Failure::http(404, ResponseHints::default(), "missing");
        let decision = classify(&failure, &RetryPolicy::default());

        boxed.on_attempt_start(1, 3);
        boxed.on_non_retryable(1, &failure, &decision);

        assert_eq!(observer.attempt_starts(), 1);
        assert_eq!(observer.non_retryable(), 1);
    }

    #[test]
    fn test_noop_and_tracing_observers_accept_events() {
        let failure = Failure::malformed("empty body");
        let decision = classify(&failure, &RetryPolicy::default());
        let attempt = failed_attempt(1, &decision);

        for observer in [
            Box::new(NoOpObserver) as Box<dyn RetryObserver>,
            Box::new(TracingObserver::new("generate-en")),
        ] {
            observer.on_attempt_start(1, 1);
            observer.on_attempt_failed(&attempt, &failure, &decision);
            observer.on_non_retryable(1, &failure, &decision);
            observer.on_exhausted(1, &failure);
        }

        assert_eq!(TracingObserver::default().operation(), "retry");
    }
}
