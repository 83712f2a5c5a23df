use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use chrono::Utc;

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.now_ms.fetch_add(secs * 1000, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Whole seconds between `start_ms` and `now_ms`, floored. A start time in
/// the future yields a negative value. Saturates on out-of-range inputs.
pub fn elapsed_seconds(now_ms: i64, start_ms: i64) -> i64 {
    now_ms.saturating_sub(start_ms).div_euclid(1000)
}

/// Format seconds as "HH:MM:SS". Hours do not roll over at 24.
pub fn format_hms(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(59), "00:00:59");
        assert_eq!(format_hms(3661), "01:01:01");
        assert_eq!(format_hms(90061), "25:01:01");
        assert_eq!(format_hms(1500), "00:25:00");
    }

    #[test]
    fn test_elapsed_seconds_floors() {
        assert_eq!(elapsed_seconds(10_999, 10_000), 0);
        assert_eq!(elapsed_seconds(11_000, 10_000), 1);
        assert_eq!(elapsed_seconds(15_500, 10_000), 5);
        assert_eq!(elapsed_seconds(9_500, 10_000), -1);
    }

    #[test]
    fn test_elapsed_seconds_saturates() {
        assert_eq!(elapsed_seconds(1_000, i64::MIN), i64::MAX.div_euclid(1000));
        assert_eq!(elapsed_seconds(-1_000, i64::MAX), i64::MIN.div_euclid(1000));
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(1_000);
        let other = clock.clone();
        clock.advance_secs(5);
        assert_eq!(other.now_ms(), 6_000);
        other.set(42);
        assert_eq!(clock.now_ms(), 42);
    }

    proptest! {
        #[test]
        fn format_hms_matches_component_law(seconds in 0u64..2_000_000u64) {
            let formatted = format_hms(seconds);
            let parts: Vec<u64> = formatted
                .split(':')
                .map(|part| part.parse().expect("numeric component"))
                .collect();

            prop_assert_eq!(parts.len(), 3);
            prop_assert_eq!(parts[0], seconds / 3600);
            prop_assert_eq!(parts[1], (seconds % 3600) / 60);
            prop_assert_eq!(parts[2], seconds % 60);
            prop_assert_eq!(parts[0] * 3600 + parts[1] * 60 + parts[2], seconds);
            prop_assert!(formatted.split(':').all(|part| part.len() >= 2));
        }
    }
}
