//! Delay policy for registrar-deferred voucher requests.
//!
//! When the registrar answers "accepted, try later" it suggests how long the
//! pledge should wait before retrying.  This module decides how much of that
//! suggestion to honor.  It intentionally contains no I/O and no clock — the
//! actual wait lives in the state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Hard upper bound on any server-suggested retry delay, in seconds.
///
/// A registrar (or an attacker impersonating one) must not be able to stall
/// the pledge for an arbitrary time.
pub const MAX_RETRY_DELAY_SECS: u64 = 60;

/// Policy mapping a server-supplied delay suggestion to an enforced wait.
///
/// The enforced delay always satisfies `0 <= delay <= max_delay_secs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayPolicy {
    /// Cap applied to the suggested delay (in seconds for serde).
    pub max_delay_secs: u64,
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self {
            max_delay_secs: MAX_RETRY_DELAY_SECS,
        }
    }
}

impl DelayPolicy {
    /// Normalize a suggested delay into an enforced wait duration.
    ///
    /// - `None` maps to zero.  The wire classification layer rejects an
    ///   accepted-retry response without an explicit numeric delay before
    ///   this policy is ever consulted, so the absent arm never introduces a
    ///   silent wait.
    /// - Zero or negative suggestions map to zero.
    /// - Suggestions above `max_delay_secs` are clamped to exactly the cap.
    ///
    /// Pure and total: every input yields a valid bounded duration.
    pub fn enforce(&self, suggested_secs: Option<i64>) -> Duration {
        match suggested_secs {
            None => Duration::ZERO,
            Some(secs) if secs <= 0 => Duration::ZERO,
            Some(secs) => Duration::from_secs((secs as u64).min(self.max_delay_secs)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
