//! Timestamp utilities and the injectable clock used by validation

use chrono::{DateTime, Datelike, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Source of "now" for time-dependent rules.
///
/// The year rule of song validation depends on the calendar year at call
/// time; tests substitute [`FixedClock`].
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar year (UTC)
    fn current_year(&self) -> i32 {
        self.now().year()
    }
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        now()
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Clock frozen at midday on 1 July of `year`
    pub fn in_year(year: i32) -> Self {
        use chrono::TimeZone;
        let instant = Utc
            .with_ymd_and_hms(year, 7, 1, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_system_clock_year_matches_now() {
        let year = SystemClock.current_year();
        assert_eq!(year, now().year());
    }

    #[test]
    fn test_fixed_clock_reports_its_year() {
        let clock = FixedClock::in_year(1999);
        assert_eq!(clock.current_year(), 1999);
        assert_eq!(clock.now(), clock.now());
    }
}
