//! Retry policy: how often and how late a retryable failure is tried again.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy for lock timeouts.
///
/// `max_attempts` counts the first try, so `1` means "never retry".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total tries including the first one.
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,

    /// Backoff multiplier for exponential backoff.
    pub multiplier: f64,

    /// Upper bound for a single delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// No retries: failures go straight back to the caller.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Is another try allowed after `attempts` tries?
    pub fn allows_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    /// Delay before the next try, after `attempts` failed tries (1-indexed).
    ///
    /// delay = base_delay * multiplier^(attempts - 1)
    ///
    /// With base_delay=50ms, multiplier=2.0:
    /// - after try 1: 50ms
    /// - after try 2: 100ms
    /// - after try 3: 200ms
    ///
    /// The result saturates at `max_delay`, also when the product overflows
    /// or the multiplier is not a finite number.
    pub fn next_delay(&self, attempts: u32) -> Duration {
        let exponent = i32::try_from(attempts.saturating_sub(1)).unwrap_or(i32::MAX);
        let delay_secs = self.base_delay().as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(delay_secs)
            .unwrap_or(self.max_delay())
            .min(self.max_delay())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 50,
            multiplier: 2.0,
            max_delay_ms: 5_000,
        }
    }
}
