//! Rate allocation and pacing math
//!
//! Pure functions so both halves of the throttling logic can be tested
//! without a clock or a registry.

use std::time::Duration;

/// Divide the bandwidth budget evenly across active sessions
///
/// An active count of zero is treated as one; that only happens in the
/// window after the last session is removed, and the result is unused since
/// nothing remains to observe it. The result is clamped to at least 1 byte/s
/// so pacing never divides by zero downstream.
pub fn shared_rate(budget: u64, active: usize) -> u64 {
    (budget / active.max(1) as u64).max(1)
}

/// Delay required so that emitting `len` bytes does not exceed `rate`
/// bytes per second
pub fn pace_delay(len: usize, rate: u64) -> Duration {
    if rate == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(len as f64 / rate as f64)
}
