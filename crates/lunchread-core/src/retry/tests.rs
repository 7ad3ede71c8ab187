//! End-to-end tests for the retry module
//!
//! These run the executor against scripted operations on a paused clock, so
//! the waits between attempts are exact and cost no real time.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::retry::{
    classify, compute_delay, Attempt, AttemptOutcome, ClassificationRule, Failure, FixedJitter,
    ResponseHints, RetryExecutorBuilder, StatsObserver,
};
use crate::types::{NetworkErrorCode, RetryPolicy, StatusOverride};

/// An operation that replays a fixed script of outcomes and counts calls
struct Script {
    steps: Mutex<VecDeque<Result<&'static str, Failure>>>,
    calls: AtomicU32,
}

impl Script {
    fn new(steps: Vec<Result<&'static str, Failure>>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicU32::new(0),
        })
    }

    fn repeat(failure: fn() -> Failure, times: usize) -> Arc<Self> {
        Self::new((0..times).map(|_| Err(failure())).collect())
    }

    fn next(&self) -> Result<&'static str, Failure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("operation called more often than scripted")
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

fn http(status: u16) -> Failure {
    Failure::http(status, ResponseHints::default(), format!("status {status}"))
}

fn http_with(status: u16, headers: &[(&str, &str)]) -> Failure {
    let hints = ResponseHints::from_headers(headers.iter().copied());
    Failure::http(status, hints, format!("status {status}"))
}

// ============================================================================
// Classification properties
// ============================================================================

#[test]
fn test_overloaded_is_retryable_under_any_policy() {
    let policies = [
        RetryPolicy::default(),
        RetryPolicy::content_generation(),
        RetryPolicy {
            retryable_status_codes: Default::default(),
            retryable_error_codes: Default::default(),
            ..RetryPolicy::default()
        },
        RetryPolicy {
            overloaded_status_code: 599,
            retryable_status_codes: Default::default(),
            ..RetryPolicy::default()
        },
    ];

    for policy in &policies {
        let failure = http(policy.overloaded_status_code);
        let decision = classify(&failure, policy);
        assert!(decision.should_retry);
        assert_eq!(decision.rule, ClassificationRule::OverloadedStatus);
    }
}

#[test]
fn test_client_error_veto_and_force_retry_override() {
    let policy = RetryPolicy::default();
    for status in (400..500).filter(|s| !policy.is_retryable_status(*s)) {
        assert!(!classify(&http(status), &policy).should_retry, "{status}");
        assert!(
            classify(&http_with(status, &[("x-should-retry", "true")]), &policy).should_retry,
            "{status}"
        );
    }
}

#[test]
fn test_classification_is_repeatable() {
    let policy = RetryPolicy::content_generation();
    let failures = [
        http(529),
        http_with(503, &[("retry-after", "4")]),
        http(404),
        Failure::network(NetworkErrorCode::TimedOut, "timeout"),
        Failure::malformed("empty"),
    ];

    for failure in &failures {
        assert_eq!(classify(failure, &policy), classify(failure, &policy));
    }
}

#[test]
fn test_overloaded_floor_holds_for_every_attempt() {
    let policy = RetryPolicy::default().with_status_override(
        529,
        StatusOverride {
            initial_delay_ms: Some(10),
            backoff_multiplier: Some(1.0),
            max_delay_ms: Some(100),
        },
    );

    for retry_after in [None, Some("0"), Some("1"), Some("60")] {
        let failure = match retry_after {
            Some(value) => http_with(529, &[("retry-after", value)]),
            None => http(529),
        };
        let decision = classify(&failure, &policy);
        for attempt in 1..=10 {
            let plan = compute_delay(attempt, &failure, &decision, &policy).unwrap();
            assert!(plan.delay >= policy.overloaded_min_delay());
        }
    }
}

#[test]
fn test_retry_after_takes_precedence_over_backoff() {
    let policy = RetryPolicy::default();
    for seconds in [0u64, 1, 7, 120] {
        let value = seconds.to_string();
        let failure = http_with(502, &[("retry-after", value.as_str())]);
        let decision = classify(&failure, &policy);
        for attempt in 1..=5 {
            let plan = compute_delay(attempt, &failure, &decision, &policy).unwrap();
            assert_eq!(plan.delay, Duration::from_millis(seconds * 1000));
        }
    }
}

// ============================================================================
// Executor scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_rate_limited_then_success() {
    let script = Script::new(vec![Err(http(429)), Ok("article")]);
    let observer = Arc::new(StatsObserver::new());
    let started = Instant::now();

    let result = RetryExecutorBuilder::new()
        .with_policy(RetryPolicy::default())
        .with_observer(observer.clone())
        .with_jitter(FixedJitter::new(Duration::from_millis(250)))
        .build()
        .execute(|| {
            let script = script.clone();
            async move { script.next() }
        })
        .await;

    assert_eq!(result.unwrap(), "article");
    assert_eq!(script.calls(), 2);
    assert_eq!(observer.delays(), vec![Duration::from_millis(2250)]);
    assert!(started.elapsed() >= Duration::from_millis(2250));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_twice_backs_off_exponentially() {
    let script = Script::new(vec![Err(http(429)), Err(http(429)), Ok("article")]);
    let observer = Arc::new(StatsObserver::new());

    let result = RetryExecutorBuilder::new()
        .with_policy(RetryPolicy::default())
        .with_observer(observer.clone())
        .with_jitter(FixedJitter::new(Duration::from_millis(100)))
        .build()
        .execute(|| {
            let script = script.clone();
            async move { script.next() }
        })
        .await;

    assert_eq!(result.unwrap(), "article");
    assert_eq!(script.calls(), 3);
    assert_eq!(
        observer.delays(),
        vec![Duration::from_millis(2100), Duration::from_millis(4100)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_successful_attempt_is_recorded() {
    let script = Script::new(vec![Err(http(503)), Ok("article")]);
    let observer = Arc::new(StatsObserver::new());

    let result = RetryExecutorBuilder::new()
        .with_policy(RetryPolicy::default())
        .with_observer(observer.clone())
        .without_jitter()
        .build()
        .execute(|| {
            let script = script.clone();
            async move { script.next() }
        })
        .await;

    assert_eq!(result.unwrap(), "article");

    let attempts = observer.attempts();
    assert_eq!(attempts.iter().map(Attempt::index).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(
        attempts[0].outcome(),
        AttemptOutcome::Failed {
            rule: ClassificationRule::RetryableStatus,
            should_retry: true,
        }
    );
    assert_eq!(attempts[1].outcome(), AttemptOutcome::Succeeded);
    assert!(attempts[1].started_at() - attempts[0].started_at() >= Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn test_not_found_is_surfaced_after_one_call() {
    let script = Script::new(vec![Err(http(404))]);

    let err = RetryExecutorBuilder::new()
        .with_policy(RetryPolicy::default())
        .build()
        .execute(|| {
            let script = script.clone();
            async move { script.next() }
        })
        .await
        .unwrap_err();

    assert!(err.is_non_retryable());
    assert_eq!(err.failure().status(), Some(404));
    assert_eq!(script.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_client_error_stops_immediately() {
    let script = Script::new(vec![Err(http(400))]);
    let observer = Arc::new(StatsObserver::new());
    let started = Instant::now();

    let err = RetryExecutorBuilder::new()
        .with_policy(RetryPolicy::default().with_max_attempts(5))
        .with_observer(observer.clone())
        .build()
        .execute(|| {
            let script = script.clone();
            async move { script.next() }
        })
        .await
        .unwrap_err();

    assert!(err.is_non_retryable());
    assert_eq!(err.attempts(), 1);
    assert_eq!(err.rule(), ClassificationRule::ClientErrorVeto);
    assert_eq!(err.failure().status(), Some(400));
    assert_eq!(script.calls(), 1);
    assert!(observer.delays().is_empty());
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_overloaded_until_exhausted() {
    let script = Script::repeat(|| http(529), 5);
    let observer = Arc::new(StatsObserver::new());

    let err = RetryExecutorBuilder::new()
        .with_policy(RetryPolicy::default().with_max_attempts(5))
        .with_observer(observer.clone())
        .without_jitter()
        .build()
        .execute(|| {
            let script = script.clone();
            async move { script.next() }
        })
        .await
        .unwrap_err();

    assert!(err.is_exhausted());
    assert_eq!(err.attempts(), 5);
    assert_eq!(script.calls(), 5);

    let delays = observer.delays();
    assert_eq!(delays.len(), 4);
    assert!(delays
        .iter()
        .all(|delay| *delay >= Duration::from_millis(5000)));
    assert_eq!(observer.rules(), vec![ClassificationRule::OverloadedStatus; 5]);
}

#[tokio::test(start_paused = true)]
async fn test_content_generation_overloaded_schedule() {
    let script = Script::repeat(|| http(529), 5);
    let observer = Arc::new(StatsObserver::new());

    let err = RetryExecutorBuilder::new()
        .with_policy(RetryPolicy::content_generation())
        .with_observer(observer.clone())
        .without_jitter()
        .build()
        .execute(|| {
            let script = script.clone();
            async move { script.next() }
        })
        .await
        .unwrap_err();

    assert_eq!(err.attempts(), 5);
    assert_eq!(
        observer.delays(),
        vec![
            Duration::from_millis(5000),
            Duration::from_millis(12500),
            Duration::from_millis(30000),
            Duration::from_millis(30000),
        ]
    );
    match err {
        crate::retry::RetryError::Exhausted { total_duration, .. } => {
            assert!(total_duration >= Duration::from_millis(77500));
            assert!(total_duration < Duration::from_millis(77600));
        }
        other => panic!("expected exhaustion, got {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_forbidden_with_force_retry_header_is_retried() {
    let script = Script::new(vec![
        Err(http_with(403, &[("x-should-retry", "true")])),
        Ok("article"),
    ]);

    let result = RetryExecutorBuilder::new()
        .with_policy(RetryPolicy::default())
        .without_jitter()
        .build()
        .execute(|| {
            let script = script.clone();
            async move { script.next() }
        })
        .await;

    assert_eq!(result.unwrap(), "article");
    assert_eq!(script.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_drives_the_wait() {
    let script = Script::new(vec![
        Err(http_with(503, &[("retry-after", "10")])),
        Err(http_with(503, &[("retry-after", "10")])),
        Ok("article"),
    ]);
    let observer = Arc::new(StatsObserver::new());
    let started = Instant::now();

    let result = RetryExecutorBuilder::new()
        .with_policy(RetryPolicy::default())
        .with_observer(observer.clone())
        .without_jitter()
        .build()
        .execute(|| {
            let script = script.clone();
            async move { script.next() }
        })
        .await;

    assert!(result.is_ok());
    assert_eq!(
        observer.delays(),
        vec![Duration::from_millis(10_000), Duration::from_millis(10_000)]
    );
    assert!(started.elapsed() >= Duration::from_millis(20_000));
}

#[tokio::test(start_paused = true)]
async fn test_network_error_then_success() {
    let script = Script::new(vec![
        Err(Failure::network(NetworkErrorCode::ConnectionReset, "socket hang up")),
        Ok("article"),
    ]);

    let result = RetryExecutorBuilder::new()
        .with_policy(RetryPolicy::default())
        .build()
        .execute(|| {
            let script = script.clone();
            async move { script.next() }
        })
        .await;

    assert_eq!(result.unwrap(), "article");
    assert_eq!(script.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_attempt_budget_respected_for_every_size() {
    for max_attempts in 1..=6 {
        let script = Script::repeat(|| http(500), max_attempts as usize);
        let observer = Arc::new(StatsObserver::new());

        let err = RetryExecutorBuilder::new()
            .with_policy(RetryPolicy::default().with_max_attempts(max_attempts))
            .with_observer(observer.clone())
            .without_jitter()
            .build()
            .execute(|| {
                let script = script.clone();
                async move { script.next() }
            })
            .await
            .unwrap_err();

        assert!(err.is_exhausted());
        assert_eq!(script.calls(), max_attempts);
        assert_eq!(observer.delays().len() as u32, max_attempts - 1);
    }
}
