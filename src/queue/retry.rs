//! Exponential backoff for task redelivery.
//!
//! A failed delivery is retried after `initial_delay * multiplier^n`, capped
//! at `max_delay`, until `max_attempts` deliveries have been made.

use std::time::Duration;

/// Configuration for exponential backoff between delivery attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Total delivery attempts (including the first) before a task is marked dead.
    pub max_attempts: u32,

    /// Delay before the first redelivery.
    pub initial_delay: Duration,

    /// Cap for exponential growth.
    pub max_delay: Duration,

    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// 10 attempts; 1s, 2s, 4s ... between them, capped at 5 minutes.
    pub const DEFAULT: Self = Self {
        max_attempts: 10,
        initial_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(300),
        backoff_multiplier: 2.0,
    };

    pub fn with_max_attempts(self, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..self
        }
    }

    /// Computes the delay after the given failed attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let multiplier = self.backoff_multiplier.powi(exponent);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;
        let capped_secs = delay_secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped_secs)
    }

    /// True once `attempts` deliveries have failed and no more are allowed.
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
