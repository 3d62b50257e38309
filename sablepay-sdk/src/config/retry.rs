//! Exponential backoff for transient request failures.

use rand::Rng;
use std::time::Duration;

use super::ConfigError;

/// Bounded exponential backoff with multiplicative jitter.
///
/// The un-jittered delay before retry `n` (0-based) is
/// `base_delay * multiplier^n`, capped at `max_delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` disables retrying.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    /// Fraction in `[0, 1]` by which a delay may be scaled up or down.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(8),
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry `retry` without jitter.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = secs.min(self.max_delay.as_secs_f64());
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_delay)
    }

    /// Delay before retry `retry` with jitter applied, never above `max_delay`.
    pub fn delay_with<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        let delay = self.backoff(retry);
        if self.jitter <= 0.0 {
            return delay;
        }
        let factor = rng.random_range((1.0 - self.jitter)..=(1.0 + self.jitter));
        let jittered = Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(delay);
        jittered.min(self.max_delay)
    }

    /// Delay before retry `retry` using the thread-local RNG.
    pub fn delay(&self, retry: u32) -> Duration {
        self.delay_with(retry, &mut rand::rng())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ConfigError::InvalidRetryPolicy(format!(
                "multiplier must be at least 1.0, got {}",
                self.multiplier
            )));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::InvalidRetryPolicy(format!(
                "jitter must be within [0, 1], got {}",
                self.jitter
            )));
        }
        if self.base_delay > self.max_delay {
            return Err(ConfigError::InvalidRetryPolicy(
                "base delay exceeds max delay".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(10),
            jitter: 0.0,
        }
    }

    #[test]
    fn test_backoff_calculation() {
        let policy = policy();
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
        // Capped at max_delay
        assert_eq!(policy.backoff(4), Duration::from_secs(10));
        assert_eq!(policy.backoff(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = RetryPolicy {
            jitter: 0.5,
            ..policy()
        };
        let mut rng = StdRng::seed_from_u64(7);
        for retry in 0..6 {
            let base = policy.backoff(retry);
            let delay = policy.delay_with(retry, &mut rng);
            assert!(delay >= base.mul_f64(0.5), "{delay:?} below {base:?}");
            assert!(delay <= policy.max_delay);
        }
    }

    #[test]
    fn test_validate() {
        assert!(RetryPolicy::default().validate().is_ok());
        assert!(
            RetryPolicy {
                multiplier: 0.5,
                ..policy()
            }
            .validate()
            .is_err()
        );
        assert!(
            RetryPolicy {
                jitter: 1.5,
                ..policy()
            }
            .validate()
            .is_err()
        );
    }
}
