//! Retry/stop oracles consulted between physical attempts.
//!
//! A policy is purely a source of wait durations; it knows nothing about
//! HTTP. One instance serves exactly one logical call, which is why
//! long-lived clients hold a [`BackoffFactory`] rather than an instance —
//! concurrent calls must never share backoff state.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::RestiveError;

/// Stateful retry/stop decision for a single logical call.
///
/// `reset` runs once before the first attempt; `next_delay` runs once per
/// failed attempt and returns the wait before the next one, or `None` to
/// stop retrying.
pub trait Backoff: Send {
    fn reset(&mut self);
    fn next_delay(&mut self) -> Option<Duration>;
}

/// Produces a fresh policy for each logical call.
pub type BackoffFactory = Arc<dyn Fn() -> Box<dyn Backoff> + Send + Sync>;

/// Invoked with the attempt error and the upcoming wait immediately before
/// each backoff sleep. Must not block for long or it stalls the retry loop.
pub type Notify = Box<dyn Fn(&RestiveError, Duration) + Send + Sync>;

/// Wraps a closure producing a concrete policy into a shared factory.
pub fn factory<B, F>(make: F) -> BackoffFactory
where
    B: Backoff + 'static,
    F: Fn() -> B + Send + Sync + 'static,
{
    Arc::new(move || Box::new(make()))
}

/// Never retries: the first failure is final.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoBackoff;

impl Backoff for NoBackoff {
    fn reset(&mut self) {}

    fn next_delay(&mut self) -> Option<Duration> {
        None
    }
}

/// Fixed delay between attempts, capped at a total attempt count.
#[derive(Clone, Debug)]
pub struct FixedBackoff {
    delay: Duration,
    max_attempts: usize,
    used: usize,
}

impl FixedBackoff {
    /// `max_attempts` counts physical attempts, the initial one included, so
    /// a value of 4 yields at most 3 waits.
    pub fn new(delay: Duration, max_attempts: usize) -> Self {
        Self {
            delay,
            max_attempts,
            used: 0,
        }
    }
}

impl Backoff for FixedBackoff {
    fn reset(&mut self) {
        self.used = 0;
    }

    fn next_delay(&mut self) -> Option<Duration> {
        if self.used + 1 >= self.max_attempts {
            return None;
        }

        self.used += 1;
        Some(self.delay)
    }
}

/// Exponentially growing delay with an upper cap and optional full jitter.
#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    initial: Duration,
    max_delay: Duration,
    max_attempts: usize,
    jitter: bool,
    attempt: usize,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max_delay: Duration, max_attempts: usize) -> Self {
        Self {
            initial,
            max_delay,
            max_attempts,
            jitter: false,
            attempt: 0,
        }
    }

    /// Randomizes each delay over `0..=delay` to spread out synchronized
    /// retries from concurrent callers.
    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }

    fn delay_for(&self, attempt: usize) -> Duration {
        let exp = attempt.min(16) as u32;
        self.initial.saturating_mul(1 << exp).min(self.max_delay)
    }
}

impl Backoff for ExponentialBackoff {
    fn reset(&mut self) {
        self.attempt = 0;
    }

    fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt + 1 >= self.max_attempts {
            return None;
        }

        let mut delay = self.delay_for(self.attempt);
        self.attempt += 1;

        if self.jitter && !delay.is_zero() {
            let cap = delay.as_millis() as u64;
            delay = Duration::from_millis(rand::rng().random_range(0..=cap));
        }

        Some(delay)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{factory, Backoff, ExponentialBackoff, FixedBackoff, NoBackoff};

    #[test]
    fn no_backoff_stops_immediately() {
        let mut policy = NoBackoff;
        policy.reset();
        assert_eq!(policy.next_delay(), None);
    }

    #[test]
    fn fixed_backoff_allows_max_attempts_minus_one_waits() {
        let mut policy = FixedBackoff::new(Duration::from_millis(5), 4);
        policy.reset();
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(5)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(5)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(5)));
        assert_eq!(policy.next_delay(), None);
    }

    #[test]
    fn fixed_backoff_reset_restores_budget() {
        let mut policy = FixedBackoff::new(Duration::from_millis(1), 2);
        policy.reset();
        assert!(policy.next_delay().is_some());
        assert_eq!(policy.next_delay(), None);
        policy.reset();
        assert!(policy.next_delay().is_some());
    }

    #[test]
    fn exponential_backoff_doubles_until_capped() {
        let mut policy =
            ExponentialBackoff::new(Duration::from_millis(10), Duration::from_millis(25), 5);
        policy.reset();
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(10)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(20)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(25)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(25)));
        assert_eq!(policy.next_delay(), None);
    }

    #[test]
    fn jittered_delay_stays_within_the_computed_bound() {
        let mut policy =
            ExponentialBackoff::new(Duration::from_millis(40), Duration::from_secs(1), 2)
                .with_jitter();
        policy.reset();
        let delay = policy.next_delay().expect("one wait budgeted");
        assert!(delay <= Duration::from_millis(40));
    }

    #[test]
    fn factory_produces_independent_instances() {
        let make = factory(|| FixedBackoff::new(Duration::from_millis(1), 2));
        let mut first = make();
        let mut second = make();
        first.reset();
        second.reset();
        assert!(first.next_delay().is_some());
        assert_eq!(first.next_delay(), None);
        // Exhausting one instance leaves the other untouched.
        assert!(second.next_delay().is_some());
    }
}
