//! Delay calculation between attempts
//!
//! The pipeline runs in a fixed order: base delay, exponential backoff, the
//! server-supplied `retry-after` replacement, the per-status cap, the
//! overloaded floor, and finally jitter. [`compute_delay`] produces everything
//! up to the floor; [`DelayPlan::with_jitter`] adds the last step.
//!
//! Non-retryable decisions never delay. They always mean stop, so
//! [`compute_delay`] returns `None` for them.

use std::time::Duration;

use crate::types::RetryPolicy;

use super::classifier::RetryDecision;
use super::failure::Failure;
use super::jitter::JitterSource;

/// Default policy-wide backoff multiplier
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Every stage of one delay computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPlan {
    /// Base delay after per-status overrides
    pub base: Duration,
    /// `base * multiplier^(attempt - 1)`
    pub backoff: Duration,
    /// Server-supplied wait, when present
    pub server_override: Option<Duration>,
    /// Cap from the per-status override, when present
    pub cap: Option<Duration>,
    /// Overloaded floor, when the status is the overloaded one
    pub floor: Option<Duration>,
    /// Final delay before jitter
    pub delay: Duration,
}

impl DelayPlan {
    /// Add jitter in `[0, upper)` drawn from `source`
    pub fn with_jitter(&self, source: &dyn JitterSource, upper: Duration) -> Duration {
        self.delay.saturating_add(source.sample(upper))
    }
}

/// Compute the wait before the attempt following `attempt` (1-based)
///
/// Returns `None` when the decision says stop.
pub fn compute_delay(
    attempt: u32,
    failure: &Failure,
    decision: &RetryDecision,
    policy: &RetryPolicy,
) -> Option<DelayPlan> {
    if !decision.should_retry {
        return None;
    }

    let status = failure.status();
    let status_override = status.and_then(|s| policy.override_for(s));

    let base = status_override
        .and_then(|o| o.initial_delay_ms)
        .map(Duration::from_millis)
        .unwrap_or_else(|| policy.base_delay());

    let multiplier = status_override
        .and_then(|o| o.backoff_multiplier)
        .unwrap_or(policy.backoff_multiplier);

    let backoff = scale(base, multiplier, attempt.max(1) - 1);

    let mut delay = decision.delay_override.unwrap_or(backoff);

    let cap = status_override
        .and_then(|o| o.max_delay_ms)
        .map(Duration::from_millis);
    if let Some(cap) = cap {
        delay = delay.min(cap);
    }

    let floor = status
        .filter(|s| policy.is_overloaded(*s))
        .map(|_| policy.overloaded_min_delay());
    if let Some(floor) = floor {
        delay = delay.max(floor);
    }

    Some(DelayPlan {
        base,
        backoff,
        server_override: decision.delay_override,
        cap,
        floor,
        delay,
    })
}

/// `base * multiplier^exponent`, saturating at `Duration::MAX`
fn scale(base: Duration, multiplier: f64, exponent: u32) -> Duration {
    let exponent = i32::try_from(exponent).unwrap_or(i32::MAX);
    let millis = base.as_millis() as f64 * multiplier.powi(exponent);
    if !millis.is_finite() || millis >= u64::MAX as f64 {
        return Duration::from_millis(u64::MAX);
    }
    Duration::from_millis(millis.max(0.0).round() as u64)
}
