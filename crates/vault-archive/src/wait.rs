use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Bounded exponential backoff for waiting on a deposit.
///
/// Delays start at one unit (`initial_ms`) and grow by `factor`. The sum
/// of all delays never exceeds `cap_units` units: the last delay is cut
/// short to land exactly on the cap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitPolicy {
    pub initial_ms: u64,
    pub factor: u32,
    pub cap_units: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            initial_ms: 1000,
            factor: 2,
            cap_units: 120,
        }
    }
}

impl WaitPolicy {
    pub fn initial(&self) -> Duration {
        Duration::from_millis(self.initial_ms)
    }

    /// Total time a wait may spend sleeping.
    pub fn cap(&self) -> Duration {
        Duration::from_millis(self.initial_ms.saturating_mul(self.cap_units as u64))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_ms == 0 {
            return Err(ConfigError::Invalid("wait.initial_ms must be positive".into()));
        }
        if self.factor < 1 {
            return Err(ConfigError::Invalid("wait.factor must be at least 1".into()));
        }
        if self.cap_units == 0 {
            return Err(ConfigError::Invalid("wait.cap_units must be positive".into()));
        }
        Ok(())
    }

    /// The sequence of delays to sleep between checks.
    pub fn delays(&self) -> Delays {
        Delays {
            next: self.initial(),
            factor: self.factor.max(1),
            remaining: self.cap(),
        }
    }
}

/// Iterator over the delays of a [`WaitPolicy`].
#[derive(Clone, Debug)]
pub struct Delays {
    next: Duration,
    factor: u32,
    remaining: Duration,
}

impl Iterator for Delays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining.is_zero() || self.next.is_zero() {
            return None;
        }
        let delay = self.next.min(self.remaining);
        self.remaining -= delay;
        self.next = self.next.checked_mul(self.factor).unwrap_or(self.remaining);
        Some(delay)
    }
}
