//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the runner and its tick bridge.
//!
//! Config is used in two ways:
//! 1. **Runner creation**: `Runner::builder(config)`
//! 2. **Bridge defaults**: every operation submitted without an explicit
//!    deadline uses [`Config::op_timeout`].
//!
//! ## Sentinel values
//! - `op_timeout = 0s` → falls back to [`DEFAULT_OP_TIMEOUT`]; an operation
//!   without a deadline would hang forever once the host stops ticking.

use std::time::Duration;

/// Deadline applied to bridge operations when none is configured.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_millis(3000);

/// Global configuration for the runner runtime.
///
/// ## Field semantics
/// - `op_timeout`: Default deadline for bridge operations (`0s` = use [`DEFAULT_OP_TIMEOUT`])
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct Config {
    /// Default deadline for each operation submitted to the tick bridge.
    ///
    /// If no tick drains the operation before the deadline, its future settles
    /// with `TaskError::Timeout` and the thunk is never invoked.
    pub op_timeout: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages will
    /// receive `Lagged` and skip older items. Minimum value is 1 (enforced by Bus).
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the operation deadline, never zero.
    #[inline]
    pub fn op_timeout(&self) -> Duration {
        if self.op_timeout == Duration::ZERO {
            DEFAULT_OP_TIMEOUT
        } else {
            self.op_timeout
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `op_timeout = 3s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            op_timeout: DEFAULT_OP_TIMEOUT,
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_falls_back_to_default() {
        let cfg = Config {
            op_timeout: Duration::ZERO,
            bus_capacity: 0,
        };
        assert_eq!(cfg.op_timeout(), DEFAULT_OP_TIMEOUT);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
