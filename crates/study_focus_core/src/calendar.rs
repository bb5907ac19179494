//! crates/study_focus_core/src/calendar.rs
//!
//! Maps instants onto calendar days in a fixed UTC offset.

use chrono::{DateTime, Days, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// `None` when the offset is outside ±24h.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::with_offset)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The calendar day `ts` falls on.
    pub fn day_of(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.offset).date_naive()
    }

    /// The first instant of `day`.
    pub fn start_of(&self, day: NaiveDate) -> DateTime<Utc> {
        let local_midnight = day.and_time(NaiveTime::MIN);
        (local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()))).and_utc()
    }

    /// `day + n` days, saturating at the end of the supported range.
    pub fn add_days(day: NaiveDate, n: u64) -> NaiveDate {
        day.checked_add_days(Days::new(n)).unwrap_or(NaiveDate::MAX)
    }

    /// `day - n` days, saturating at the start of the supported range.
    pub fn sub_days(day: NaiveDate, n: u64) -> NaiveDate {
        day.checked_sub_days(Days::new(n)).unwrap_or(NaiveDate::MIN)
    }

    /// Formats `ts` as a short calendar date, e.g. `Jan 5, 2024`.
    pub fn format_date(&self, ts: DateTime<Utc>) -> String {
        ts.with_timezone(&self.offset).format("%b %-d, %Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_boundaries_follow_the_offset() {
        let plus_two = Calendar::from_offset_minutes(120).unwrap();
        let late_evening_utc = Utc.with_ymd_and_hms(2024, 3, 9, 23, 30, 0).unwrap();

        assert_eq!(
            Calendar::utc().day_of(late_evening_utc),
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
        );
        assert_eq!(
            plus_two.day_of(late_evening_utc),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
    }

    #[test]
    fn start_of_day_is_local_midnight() {
        let plus_two = Calendar::from_offset_minutes(120).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(
            plus_two.start_of(day),
            Utc.with_ymd_and_hms(2024, 3, 9, 22, 0, 0).unwrap()
        );
    }

    #[test]
    fn rejects_absurd_offsets() {
        assert!(Calendar::from_offset_minutes(60 * 30).is_none());
    }

    #[test]
    fn formats_short_dates() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();
        assert_eq!(Calendar::utc().format_date(ts), "Jan 5, 2024");
    }
}
