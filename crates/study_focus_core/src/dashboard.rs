//! crates/study_focus_core/src/dashboard.rs
//!
//! Read-only aggregation over a snapshot of tasks and study sessions:
//! statistics, the suggested daily plan, recent activity and the combined
//! dashboard record. Nothing here mutates or persists.

use crate::calendar::Calendar;
use crate::domain::{StudySession, Task, UserRecord};
use crate::ledger::planning_view;
use crate::study_log::{daily_totals, streak, DailyTotal, DEFAULT_WINDOW_DAYS};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Default number of entries in the recent-activity feed.
pub const DEFAULT_ACTIVITY_LIMIT: usize = 10;

//=========================================================================================
// Task and study statistics
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub completion_percent: u32,
}

pub fn task_stats(tasks: &[Task]) -> TaskStats {
    let total = tasks.len();
    let completed = tasks.iter().filter(|t| t.completed).count();
    TaskStats {
        total,
        completed,
        pending: total - completed,
        completion_percent: rounded_ratio(completed as u64 * 100, total as u64),
    }
}

/// `round(numerator / denominator)` with halves rounded up; 0 when the denominator is 0.
fn rounded_ratio(numerator: u64, denominator: u64) -> u32 {
    if denominator == 0 {
        return 0;
    }
    u32::try_from((2 * numerator + denominator) / (2 * denominator)).unwrap_or(u32::MAX)
}

/// Incomplete tasks due in `[anchor_day, anchor_day + 2 days)`.
pub fn upcoming_count(tasks: &[Task], calendar: &Calendar, anchor_day: chrono::NaiveDate) -> usize {
    let start = calendar.start_of(anchor_day);
    let end = calendar.start_of(Calendar::add_days(anchor_day, 2));
    tasks
        .iter()
        .filter(|t| !t.completed)
        .filter_map(|t| t.due_date)
        .filter(|due| *due >= start && *due < end)
        .count()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyStats {
    pub session_count: usize,
    pub total_minutes: u64,
    pub average_minutes: u32,
}

impl StudyStats {
    pub fn total_display(&self) -> String {
        format_minutes(self.total_minutes)
    }
}

pub fn study_stats(sessions: &[StudySession]) -> StudyStats {
    let total_minutes: u64 = sessions.iter().map(|s| u64::from(s.duration)).sum();
    StudyStats {
        session_count: sessions.len(),
        total_minutes,
        average_minutes: rounded_ratio(total_minutes, sessions.len() as u64),
    }
}

/// `"45 min"` under an hour, otherwise `"2h 5m"`.
pub fn format_minutes(total: u64) -> String {
    if total < 60 {
        format!("{total} min")
    } else {
        format!("{}h {}m", total / 60, total % 60)
    }
}

//=========================================================================================
// Suggested plan
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Deep,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanSlot {
    pub name: &'static str,
    pub kind: SlotKind,
}

pub const PLAN_SLOTS: [PlanSlot; 4] = [
    PlanSlot {
        name: "Morning Focus (9:00–11:00)",
        kind: SlotKind::Deep,
    },
    PlanSlot {
        name: "Noon Maintenance (12:00–13:00)",
        kind: SlotKind::Light,
    },
    PlanSlot {
        name: "Afternoon Push (15:00–17:00)",
        kind: SlotKind::Deep,
    },
    PlanSlot {
        name: "Evening Review (19:00–20:00)",
        kind: SlotKind::Light,
    },
];

pub const EMPTY_PLAN_MESSAGE: &str = "Add tasks to generate a plan.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    pub slot: &'static str,
    pub kind: SlotKind,
    /// `None` when there was nothing to plan.
    pub task_id: Option<String>,
    pub suggestion: String,
}

/// One entry per fixed slot, filled from incomplete tasks in planning order.
///
/// With fewer tasks than slots the last (lowest-priority) task repeats; with
/// no tasks every slot carries a placeholder. No conflict detection.
pub fn suggested_plan(tasks: &[Task], calendar: &Calendar) -> Vec<PlanEntry> {
    let ordered = planning_view(tasks);
    PLAN_SLOTS
        .iter()
        .enumerate()
        .map(|(i, slot)| match ordered.get(i).or(ordered.last()) {
            Some(task) => PlanEntry {
                slot: slot.name,
                kind: slot.kind,
                task_id: Some(task.id.clone()),
                suggestion: suggestion_for(slot, task, calendar),
            },
            None => PlanEntry {
                slot: slot.name,
                kind: slot.kind,
                task_id: None,
                suggestion: EMPTY_PLAN_MESSAGE.to_string(),
            },
        })
        .collect()
}

fn suggestion_for(slot: &PlanSlot, task: &Task, calendar: &Calendar) -> String {
    let action = match slot.kind {
        SlotKind::Deep => "Work in 40/10 blocks",
        SlotKind::Light => "Do a 20-min review",
    };
    let due = task
        .due_date
        .map(|d| calendar.format_date(d))
        .unwrap_or_else(|| "No due date".to_string());
    format!(
        "{action} on “{}” (Due: {due}, Priority: {})",
        task.title, task.priority
    )
}

//=========================================================================================
// Recent activity
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Study,
    TaskCreated,
    TaskCompleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub kind: ActivityKind,
    pub at: DateTime<Utc>,
    pub description: String,
    /// Human-readable age relative to the snapshot time.
    pub age: String,
}

/// Sessions and tasks merged into one feed, newest first, at most `limit` long.
///
/// A task appears once, stamped with its creation time, and is described as
/// completed or created depending on its current state.
pub fn recent_activity(
    sessions: &[StudySession],
    tasks: &[Task],
    now: DateTime<Utc>,
    calendar: &Calendar,
    limit: usize,
) -> Vec<Activity> {
    let studies = sessions.iter().map(|s| {
        (
            ActivityKind::Study,
            s.date,
            format!("Studied for {} minutes", s.duration),
        )
    });
    let task_events = tasks.iter().map(|t| {
        if t.completed {
            (
                ActivityKind::TaskCompleted,
                t.created_at,
                format!("Completed task: {}", t.title),
            )
        } else {
            (
                ActivityKind::TaskCreated,
                t.created_at,
                format!("Created task: {}", t.title),
            )
        }
    });

    let mut merged: Vec<_> = studies.chain(task_events).collect();
    merged.sort_by(|a, b| b.1.cmp(&a.1));
    merged
        .into_iter()
        .take(limit)
        .map(|(kind, at, description)| Activity {
            kind,
            at,
            description,
            age: relative_age(at, now, calendar),
        })
        .collect()
}

/// "just now", "N minutes ago", "N hours ago", "N days ago", else a calendar date.
pub fn relative_age(at: DateTime<Utc>, now: DateTime<Utc>, calendar: &Calendar) -> String {
    let seconds = (now - at).num_seconds();
    match seconds {
        s if s < 60 => "just now".to_string(),
        s if s < 3_600 => format!("{} minutes ago", s / 60),
        s if s < 86_400 => format!("{} hours ago", s / 3_600),
        s if s < 604_800 => format!("{} days ago", s / 86_400),
        _ => calendar.format_date(at),
    }
}

//=========================================================================================
// Dashboard snapshot
//=========================================================================================

/// Progression figures of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub name: String,
    pub xp: u64,
    pub level: u32,
    pub badges: Vec<String>,
}

impl From<&UserRecord> for Progress {
    fn from(user: &UserRecord) -> Self {
        Self {
            name: user.name.clone(),
            xp: user.xp,
            level: user.level,
            badges: user.badges.iter().map(str::to_string).collect(),
        }
    }
}

/// Everything the dashboard shows, computed in one pull.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub progress: Option<Progress>,
    pub tasks: TaskStats,
    pub upcoming: usize,
    pub study: StudyStats,
    pub total_study_time: String,
    pub daily_totals: Vec<DailyTotal>,
    pub streak: u32,
    pub recent_activity: Vec<Activity>,
    pub plan: Vec<PlanEntry>,
}

impl DashboardSnapshot {
    pub fn build(
        tasks: &[Task],
        sessions: &[StudySession],
        progress: Option<Progress>,
        now: DateTime<Utc>,
        calendar: &Calendar,
    ) -> Self {
        let today = calendar.day_of(now);
        let study = study_stats(sessions);
        Self {
            generated_at: now,
            progress,
            tasks: task_stats(tasks),
            upcoming: upcoming_count(tasks, calendar, today),
            total_study_time: study.total_display(),
            study,
            daily_totals: daily_totals(sessions, calendar, DEFAULT_WINDOW_DAYS, today),
            streak: streak(sessions, calendar, today),
            recent_activity: recent_activity(
                sessions,
                tasks,
                now,
                calendar,
                DEFAULT_ACTIVITY_LIMIT,
            ),
            plan: suggested_plan(tasks, calendar),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Priority;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap()
    }

    fn task(id: &str, priority: Priority, due: Option<DateTime<Utc>>, completed: bool) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: None,
            priority,
            due_date: due,
            completed,
            created_at: now() - Duration::hours(1),
        }
    }

    #[test]
    fn empty_task_list_has_zero_percent() {
        assert_eq!(task_stats(&[]), TaskStats::default());
    }

    #[test]
    fn completion_percent_rounds_half_up() {
        let tasks = vec![
            task("a", Priority::Low, None, true),
            task("b", Priority::Low, None, false),
            task("c", Priority::Low, None, false),
        ];
        let stats = task_stats(&tasks);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.completion_percent, 33);

        let half = &tasks[..2];
        assert_eq!(task_stats(half).completion_percent, 50);
    }

    #[test]
    fn upcoming_covers_today_and_tomorrow_only() {
        let cal = Calendar::utc();
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let tasks = vec![
            task("today", Priority::Low, Some(cal.start_of(today)), false),
            task(
                "tomorrow-late",
                Priority::Low,
                Some(cal.start_of(today) + Duration::hours(47)),
                false,
            ),
            task(
                "day-after",
                Priority::Low,
                Some(cal.start_of(Calendar::add_days(today, 2))),
                false,
            ),
            task("done", Priority::Low, Some(cal.start_of(today)), true),
            task(
                "yesterday",
                Priority::Low,
                Some(cal.start_of(today) - Duration::seconds(1)),
                false,
            ),
            task("undated", Priority::Low, None, false),
        ];
        assert_eq!(upcoming_count(&tasks, &cal, today), 2);
    }

    #[test]
    fn study_stats_average_and_display() {
        let sessions: Vec<StudySession> = [25, 50, 50]
            .iter()
            .enumerate()
            .map(|(i, m)| StudySession {
                id: i.to_string(),
                duration: *m,
                date: now(),
            })
            .collect();
        let stats = study_stats(&sessions);
        assert_eq!(stats.total_minutes, 125);
        assert_eq!(stats.average_minutes, 42);
        assert_eq!(stats.total_display(), "2h 5m");
        assert_eq!(format_minutes(45), "45 min");
        assert_eq!(study_stats(&[]).average_minutes, 0);
    }

    #[test]
    fn plan_without_tasks_is_all_placeholders() {
        let plan = suggested_plan(&[], &Calendar::utc());
        assert_eq!(plan.len(), 4);
        assert!(plan
            .iter()
            .all(|p| p.task_id.is_none() && p.suggestion == EMPTY_PLAN_MESSAGE));
    }

    #[test]
    fn plan_repeats_the_lowest_priority_task() {
        let due = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
        let tasks = vec![
            task("low", Priority::Low, None, false),
            task("high", Priority::High, Some(due), false),
            task("done", Priority::High, None, true),
        ];
        let plan = suggested_plan(&tasks, &Calendar::utc());
        let picks: Vec<_> = plan.iter().map(|p| p.task_id.as_deref()).collect();

        assert_eq!(picks, vec![Some("high"), Some("low"), Some("low"), Some("low")]);
        assert_eq!(
            plan[0].suggestion,
            "Work in 40/10 blocks on “Task high” (Due: Jan 5, 2024, Priority: high)"
        );
        assert_eq!(
            plan[1].suggestion,
            "Do a 20-min review on “Task low” (Due: No due date, Priority: low)"
        );
    }

    #[test]
    fn relative_age_buckets() {
        let cal = Calendar::utc();
        let n = now();
        assert_eq!(relative_age(n - Duration::seconds(59), n, &cal), "just now");
        assert_eq!(relative_age(n - Duration::minutes(5), n, &cal), "5 minutes ago");
        assert_eq!(relative_age(n - Duration::hours(3), n, &cal), "3 hours ago");
        assert_eq!(relative_age(n - Duration::days(6), n, &cal), "6 days ago");
        assert_eq!(relative_age(n - Duration::days(7), n, &cal), "May 13, 2024");
    }

    #[test]
    fn activity_is_newest_first_and_truncated() {
        let sessions: Vec<StudySession> = (0..8)
            .map(|i| StudySession {
                id: i.to_string(),
                duration: 25,
                date: now() - Duration::hours(i),
            })
            .collect();
        let mut tasks = vec![
            task("fresh", Priority::Low, None, false),
            task("finished", Priority::Low, None, true),
        ];
        tasks[0].created_at = now() - Duration::minutes(10);
        tasks[1].created_at = now() - Duration::days(30);

        let feed = recent_activity(&sessions, &tasks, now(), &Calendar::utc(), 5);
        assert_eq!(feed.len(), 5);
        assert_eq!(feed[0].description, "Studied for 25 minutes");
        assert_eq!(feed[0].age, "just now");
        assert_eq!(feed[1].kind, ActivityKind::TaskCreated);
        assert_eq!(feed[1].description, "Created task: Task fresh");
        assert!(feed.windows(2).all(|w| w[0].at >= w[1].at));
    }

    #[test]
    fn snapshot_combines_everything() {
        let tasks = vec![task("a", Priority::High, None, false)];
        let sessions = vec![StudySession {
            id: "1".into(),
            duration: 30,
            date: now(),
        }];
        let snapshot = DashboardSnapshot::build(&tasks, &sessions, None, now(), &Calendar::utc());

        assert_eq!(snapshot.tasks.total, 1);
        assert_eq!(snapshot.streak, 1);
        assert_eq!(snapshot.daily_totals.len(), 7);
        assert_eq!(snapshot.daily_totals[6].minutes, 30);
        assert_eq!(snapshot.total_study_time, "30 min");
        assert_eq!(snapshot.plan.len(), 4);
        assert!(snapshot.progress.is_none());
    }
}
