//! Timestamp utilities

use chrono::{DateTime, Utc};

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert fractional seconds to a duration, clamping negatives to zero
pub fn seconds_to_duration(seconds: f64) -> std::time::Duration {
    if seconds <= 0.0 || !seconds.is_finite() {
        return std::time::Duration::ZERO;
    }
    std::time::Duration::from_nanos((seconds * NANOS_PER_SECOND) as u64)
}

/// Duration elapsed from `begin` to `end`, or `None` if `end` precedes `begin`
pub fn duration_between(begin: DateTime<Utc>, end: DateTime<Utc>) -> Option<std::time::Duration> {
    (end - begin).to_std().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_seconds_to_duration_zero() {
        assert_eq!(seconds_to_duration(0.0), Duration::ZERO);
    }

    #[test]
    fn test_seconds_to_duration_fractional() {
        assert_eq!(seconds_to_duration(1.5), Duration::from_millis(1500));
    }

    #[test]
    fn test_seconds_to_duration_negative_clamps() {
        assert_eq!(seconds_to_duration(-3.0), Duration::ZERO);
        assert_eq!(seconds_to_duration(f64::NAN), Duration::ZERO);
    }

    #[test]
    fn test_duration_between_forward() {
        let begin = now();
        let end = begin + ChronoDuration::seconds(32);
        assert_eq!(duration_between(begin, end), Some(Duration::from_secs(32)));
    }

    #[test]
    fn test_duration_between_backward_is_none() {
        let begin = now();
        let end = begin - ChronoDuration::seconds(1);
        assert_eq!(duration_between(begin, end), None);
    }
}
