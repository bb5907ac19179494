//! crates/study_focus_core/src/study_log.rs
//!
//! Append-only log of completed study sessions and the day-based figures
//! derived from it.

use crate::calendar::Calendar;
use crate::domain::{timestamp_id, StudySession};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Default width of the daily-totals window.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

pub struct StudyLog<'a> {
    sessions: &'a mut Vec<StudySession>,
}

impl<'a> StudyLog<'a> {
    pub fn new(sessions: &'a mut Vec<StudySession>) -> Self {
        Self { sessions }
    }

    /// Records a finished session stamped `now`. Zero-minute sessions are ignored.
    pub fn append(&mut self, duration_minutes: u32, now: DateTime<Utc>) -> Option<&StudySession> {
        if duration_minutes == 0 {
            return None;
        }
        let id = timestamp_id("", self.sessions.iter().map(|s| s.id.as_str()), now);
        self.sessions.push(StudySession {
            id,
            duration: duration_minutes,
            date: now,
        });
        self.sessions.last()
    }
}

/// Minutes studied on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyTotal {
    pub day: NaiveDate,
    pub minutes: u64,
}

/// Exactly `window` consecutive days ending at `anchor`, oldest first.
/// Days without sessions report 0.
pub fn daily_totals(
    sessions: &[StudySession],
    calendar: &Calendar,
    window: u32,
    anchor: NaiveDate,
) -> Vec<DailyTotal> {
    let mut per_day: HashMap<NaiveDate, u64> = HashMap::new();
    for session in sessions {
        *per_day.entry(calendar.day_of(session.date)).or_default() += u64::from(session.duration);
    }

    (0..u64::from(window))
        .rev()
        .map(|back| {
            let day = Calendar::sub_days(anchor, back);
            DailyTotal {
                day,
                minutes: per_day.get(&day).copied().unwrap_or(0),
            }
        })
        .collect()
}

/// Consecutive days with at least one session, walking back from `anchor`.
///
/// The walk starts at `anchor` when it has a session and at the day before
/// otherwise, so a streak survives until the end of the following day.
pub fn streak(sessions: &[StudySession], calendar: &Calendar, anchor: NaiveDate) -> u32 {
    let days: HashSet<NaiveDate> = sessions.iter().map(|s| calendar.day_of(s.date)).collect();
    if days.is_empty() {
        return 0;
    }

    let mut day = if days.contains(&anchor) {
        Some(anchor)
    } else {
        anchor.pred_opt()
    };
    let mut count = 0;
    while let Some(current) = day.filter(|d| days.contains(d)) {
        count += 1;
        day = current.pred_opt();
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    fn session_on(day: NaiveDate, minutes: u32) -> StudySession {
        let date = day.and_hms_opt(12, 0, 0).unwrap().and_utc();
        StudySession {
            id: date.timestamp_millis().to_string(),
            duration: minutes,
            date,
        }
    }

    fn days_back(n: u64) -> NaiveDate {
        Calendar::sub_days(today(), n)
    }

    #[test]
    fn streak_stops_at_first_gap() {
        let sessions = vec![
            session_on(days_back(0), 25),
            session_on(days_back(1), 25),
            session_on(days_back(2), 25),
            session_on(days_back(4), 25),
        ];
        assert_eq!(streak(&sessions, &Calendar::utc(), today()), 3);
    }

    #[test]
    fn streak_may_start_yesterday() {
        let sessions = vec![session_on(days_back(1), 25), session_on(days_back(2), 25)];
        assert_eq!(streak(&sessions, &Calendar::utc(), today()), 2);
    }

    #[test]
    fn streak_is_zero_without_recent_sessions() {
        assert_eq!(streak(&[], &Calendar::utc(), today()), 0);

        let stale = vec![session_on(days_back(3), 25)];
        assert_eq!(streak(&stale, &Calendar::utc(), today()), 0);
    }

    #[test]
    fn empty_window_is_all_zeroes_oldest_first() {
        let totals = daily_totals(&[], &Calendar::utc(), DEFAULT_WINDOW_DAYS, today());

        assert_eq!(totals.len(), 7);
        assert!(totals.iter().all(|t| t.minutes == 0));
        assert_eq!(totals.first().map(|t| t.day), Some(days_back(6)));
        assert_eq!(totals.last().map(|t| t.day), Some(today()));
    }

    #[test]
    fn daily_totals_sum_per_day_and_skip_out_of_window() {
        let sessions = vec![
            session_on(days_back(0), 25),
            session_on(days_back(0), 50),
            session_on(days_back(3), 15),
            session_on(days_back(9), 60),
        ];
        let totals = daily_totals(&sessions, &Calendar::utc(), 7, today());
        let minutes: Vec<u64> = totals.iter().map(|t| t.minutes).collect();
        assert_eq!(minutes, vec![0, 0, 0, 15, 0, 0, 75]);
    }

    #[test]
    fn append_ignores_empty_sessions() {
        let mut sessions = Vec::new();
        let mut log = StudyLog::new(&mut sessions);
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 9, 0, 0).unwrap();

        assert!(log.append(0, now).is_none());
        assert_eq!(log.append(25, now).map(|s| s.duration), Some(25));
        assert!(log.append(25, now).is_some());
        assert_eq!(sessions.len(), 2);
        assert_ne!(sessions[0].id, sessions[1].id);
    }
}
