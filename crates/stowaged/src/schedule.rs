//! Daily schedule arithmetic.
//!
//! The daemon wakes once per day at a fixed UTC time. Keeping the arithmetic
//! here, separate from the cycle itself, means the core stays schedulable by
//! anything (cron, a service manager timer, this daemon) without changes.

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};

/// Fires once per day at `at` (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    /// The first scheduled instant strictly after `now`.
    ///
    /// An exact hit counts as already fired, so a tick that finishes within
    /// the same second cannot run twice.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.at).and_utc();
        if today > now {
            today
        } else {
            today + TimeDelta::days(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn schedule() -> DailySchedule {
        DailySchedule::new(NaiveTime::from_hms_opt(3, 0, 0).unwrap())
    }

    #[test]
    fn before_the_tick_fires_today() {
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 1, 30, 0).unwrap();
        assert_eq!(
            schedule().next_after(now),
            Utc.with_ymd_and_hms(2026, 8, 25, 3, 0, 0).unwrap()
        );
    }

    #[test]
    fn after_the_tick_fires_tomorrow() {
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 14, 0, 0).unwrap();
        assert_eq!(
            schedule().next_after(now),
            Utc.with_ymd_and_hms(2026, 8, 26, 3, 0, 0).unwrap()
        );
    }

    #[test]
    fn exactly_at_the_tick_fires_tomorrow() {
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 3, 0, 0).unwrap();
        assert_eq!(
            schedule().next_after(now),
            Utc.with_ymd_and_hms(2026, 8, 26, 3, 0, 0).unwrap()
        );
    }

    #[test]
    fn rolls_over_month_boundaries() {
        let now = Utc.with_ymd_and_hms(2026, 8, 31, 23, 59, 59).unwrap();
        assert_eq!(
            schedule().next_after(now),
            Utc.with_ymd_and_hms(2026, 9, 1, 3, 0, 0).unwrap()
        );
    }
}
