//! Reconnect backoff for the UI reader.
//!
//! The delay for failed attempt `n` (0-indexed) is `first × factor^n`, clamped
//! to `max`. The delay is derived from the attempt count alone, never from
//! the previous delay.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectBackoff {
    /// Delay after the first failed attempt.
    pub first: Duration,
    /// Maximum delay.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0`).
    pub factor: f64,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self {
            first: Duration::from_millis(250),
            max: Duration::from_secs(5),
            factor: 2.0,
        }
    }
}

impl ReconnectBackoff {
    /// Backoff that never delays a reconnect.
    pub const NONE: ReconnectBackoff = ReconnectBackoff {
        first: Duration::ZERO,
        max: Duration::ZERO,
        factor: 1.0,
    };

    /// Delay to wait after `attempt` consecutive failures (0-indexed).
    pub fn delay(&self, attempt: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        if !secs.is_finite() || secs < 0.0 || secs > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}
