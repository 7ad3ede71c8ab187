//! Jitter sources
//!
//! Randomness is injected so tests can pin the exact wait.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces the random component added to each wait
pub trait JitterSource: Send + Sync {
    /// Sample a duration in `[0, upper)`
    fn sample(&self, upper: Duration) -> Duration;
}

/// Uniform jitter at millisecond resolution backed by `StdRng`
#[derive(Debug)]
pub struct RandomJitter {
    rng: Mutex<StdRng>,
}

impl RandomJitter {
    /// Seed from the operating system
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic sequence for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomJitter {
    fn default() -> Self {
        Self::new()
    }
}

impl JitterSource for RandomJitter {
    fn sample(&self, upper: Duration) -> Duration {
        let upper_ms = u64::try_from(upper.as_millis()).unwrap_or(u64::MAX);
        if upper_ms == 0 {
            return Duration::ZERO;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Duration::from_millis(rng.random_range(0..upper_ms))
    }
}

/// No jitter at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn sample(&self, _upper: Duration) -> Duration {
        Duration::ZERO
    }
}

/// A constant jitter, clamped to the requested upper bound
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(Duration);

impl FixedJitter {
    pub fn new(value: Duration) -> Self {
        Self(value)
    }
}

impl JitterSource for FixedJitter {
    fn sample(&self, upper: Duration) -> Duration {
        self.0.min(upper)
    }
}

impl<T: JitterSource + ?Sized> JitterSource for Arc<T> {
    fn sample(&self, upper: Duration) -> Duration {
        (**self).sample(upper)
    }
}

impl<T: JitterSource + ?Sized> JitterSource for Box<T> {
    fn sample(&self, upper: Duration) -> Duration {
        (**self).sample(upper)
    }
}
