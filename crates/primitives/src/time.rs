//! Epoch-millisecond timestamp helpers.
//!
//! All persisted dates in the record model are epoch milliseconds.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds in one hour.
pub const MILLIS_PER_HOUR: u64 = 60 * 60 * 1_000;

/// Current time as epoch milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as u64
}

/// Age of `then_millis` relative to `now_millis`, in fractional hours.
/// Returns zero for timestamps in the future.
pub fn age_hours(now_millis: u64, then_millis: u64) -> f64 {
    now_millis.saturating_sub(then_millis) as f64 / MILLIS_PER_HOUR as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_is_fractional_hours() {
        let now = 100 * MILLIS_PER_HOUR;
        assert_eq!(age_hours(now, 48 * MILLIS_PER_HOUR), 52.0);
        assert_eq!(age_hours(now, now - MILLIS_PER_HOUR / 2), 0.5);
    }

    #[test]
    fn future_timestamps_have_zero_age() {
        assert_eq!(age_hours(1_000, 2_000), 0.0);
    }

    #[test]
    fn now_is_sane() {
        // Anything after 2020-01-01 counts as a working clock.
        assert!(now_millis() > 1_577_836_800_000);
    }
}
