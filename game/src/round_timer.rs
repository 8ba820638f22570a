use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Time budget for one decryption round. Elapsed time stops at the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTimer {
    #[serde(with = "crate::serde_duration")]
    elapsed: Duration,
    #[serde(with = "crate::serde_duration")]
    limit: Duration,
}

impl RoundTimer {
    pub fn new(limit: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.elapsed)
    }

    /// Share of the budget left, in `0.0..=1.0`; a zero limit counts as spent.
    pub fn remaining_fraction(&self) -> f64 {
        if self.limit.is_zero() {
            return 0.0;
        }
        self.remaining().as_secs_f64() / self.limit.as_secs_f64()
    }

    pub fn is_up(&self) -> bool {
        self.elapsed >= self.limit
    }

    /// Adds `dt`. Returns true only on the call that runs the budget out.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if self.is_up() {
            return false;
        }
        self.elapsed = self.elapsed.saturating_add(dt).min(self.limit);
        self.is_up()
    }
}
