//! crates/study_focus_core/src/session.rs
//!
//! The `Session` context every caller goes through. It owns the injected
//! store and clock, resolves the current user once per operation, applies
//! the change (ledger, study log, gamification) to that one record and
//! saves it back.
//!
//! Without a signed-in user every mutating operation is a no-op that
//! returns `None` / `false`.

use crate::calendar::Calendar;
use crate::dashboard::DashboardSnapshot;
use crate::domain::{NewTask, StudySession, Task, TaskUpdate, UserRecord};
use crate::gamification::{self, AwardEvent, AwardOutcome};
use crate::ledger::{self, TaskFilter, TaskLedger, TaskSort, Toggle};
use crate::ports::{Clock, PortResult};
use crate::repository::UserRepository;
use crate::store::{keys, DocumentStore};
use crate::study_log::{self, DailyTotal, StudyLog};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Result of toggling a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOutcome {
    pub transition: Toggle,
    /// Present only for the false → true transition.
    pub award: Option<AwardOutcome>,
}

/// Result of completing a timer work interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalOutcome {
    pub session: StudySession,
    pub award: AwardOutcome,
}

pub struct Session {
    users: UserRepository,
    store: DocumentStore,
    clock: Arc<dyn Clock>,
    calendar: Calendar,
}

impl Session {
    pub fn new(store: DocumentStore, clock: Arc<dyn Clock>, calendar: Calendar) -> Self {
        Self {
            users: UserRepository::new(store.clone()),
            store,
            clock,
            calendar,
        }
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn current_user(&self) -> PortResult<Option<UserRecord>> {
        self.users.current_user().await
    }

    /// Runs `op` against the current user and saves the record when `op`
    /// reports a change by returning `Some`.
    async fn with_current_user<R, F>(&self, op: F) -> PortResult<Option<R>>
    where
        F: FnOnce(&mut UserRecord, DateTime<Utc>) -> Option<R> + Send,
        R: Send,
    {
        let Some(mut user) = self.users.current_user().await? else {
            debug!("no current user, skipping");
            return Ok(None);
        };
        let Some(result) = op(&mut user, self.clock.now()) else {
            return Ok(None);
        };
        if !self.users.save(&user).await? {
            return Ok(None);
        }
        Ok(Some(result))
    }

    //-------------------------------------------------------------------------------------
    // Task ledger
    //-------------------------------------------------------------------------------------

    /// Adds a task for the current user. Blank titles are ignored.
    #[instrument(skip(self, new_task), fields(title = %new_task.title))]
    pub async fn add_task(&self, mut new_task: NewTask) -> PortResult<Option<Task>> {
        new_task.title = new_task.title.trim().to_string();
        if new_task.title.is_empty() {
            warn!("ignoring task with an empty title");
            return Ok(None);
        }
        let task = self
            .with_current_user(move |user, now| {
                Some(TaskLedger::new(&mut user.tasks).add(new_task, now).clone())
            })
            .await?;
        if let Some(task) = &task {
            info!(task_id = %task.id, "task added");
        }
        Ok(task)
    }

    /// Flips a task's completion; completing it awards `task_completed` once.
    #[instrument(skip(self))]
    pub async fn toggle_task(&self, task_id: &str) -> PortResult<Option<ToggleOutcome>> {
        self.with_current_user(|user, _| {
            let transition = TaskLedger::new(&mut user.tasks).toggle(task_id)?;
            let award = match transition {
                Toggle::Completed => Some(gamification::award(user, AwardEvent::TaskCompleted)),
                Toggle::Reopened => None,
            };
            Some(ToggleOutcome { transition, award })
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn remove_task(&self, task_id: &str) -> PortResult<bool> {
        let removed = self
            .with_current_user(|user, _| TaskLedger::new(&mut user.tasks).remove(task_id).then_some(()))
            .await?;
        Ok(removed.is_some())
    }

    #[instrument(skip(self, update))]
    pub async fn update_task(&self, task_id: &str, update: TaskUpdate) -> PortResult<bool> {
        let updated = self
            .with_current_user(move |user, _| {
                TaskLedger::new(&mut user.tasks)
                    .update(task_id, update)
                    .then_some(())
            })
            .await?;
        Ok(updated.is_some())
    }

    /// Removes every completed task, returning how many went.
    #[instrument(skip(self))]
    pub async fn clear_completed(&self) -> PortResult<usize> {
        let cleared = self
            .with_current_user(|user, _| {
                let n = TaskLedger::new(&mut user.tasks).clear_completed();
                (n > 0).then_some(n)
            })
            .await?;
        Ok(cleared.unwrap_or(0))
    }

    /// The current user's tasks, filtered then sorted. Empty when anonymous.
    pub async fn view_tasks(&self, filter: TaskFilter, sort: TaskSort) -> PortResult<Vec<Task>> {
        let Some(user) = self.current_user().await? else {
            return Ok(Vec::new());
        };
        Ok(ledger::view(&user.tasks, filter, sort)
            .iter()
            .cloned()
            .collect())
    }

    //-------------------------------------------------------------------------------------
    // Study log and gamification
    //-------------------------------------------------------------------------------------

    /// Logs a finished study session of `duration_minutes` (> 0).
    #[instrument(skip(self))]
    pub async fn append_study_session(
        &self,
        duration_minutes: u32,
    ) -> PortResult<Option<StudySession>> {
        self.with_current_user(|user, now| {
            StudyLog::new(&mut user.study_sessions)
                .append(duration_minutes, now)
                .cloned()
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn award(&self, event: AwardEvent) -> PortResult<Option<AwardOutcome>> {
        self.with_current_user(|user, _| Some(gamification::award(user, event)))
            .await
    }

    /// Returns whether the badge was new.
    #[instrument(skip(self))]
    pub async fn add_badge(&self, name: &str) -> PortResult<bool> {
        let added = self
            .with_current_user(|user, _| gamification::add_badge(user, name).then_some(()))
            .await?;
        Ok(added.is_some())
    }

    /// Logs a finished work interval and awards `study_session` in one write.
    #[instrument(skip(self))]
    pub async fn complete_work_interval(
        &self,
        duration_minutes: u32,
    ) -> PortResult<Option<IntervalOutcome>> {
        self.with_current_user(|user, now| {
            let session = StudyLog::new(&mut user.study_sessions)
                .append(duration_minutes, now)?
                .clone();
            let award = gamification::award(user, AwardEvent::StudySession);
            Some(IntervalOutcome { session, award })
        })
        .await
    }

    /// Minutes per day over the last `window` days, oldest first.
    pub async fn daily_totals(&self, window: u32) -> PortResult<Vec<DailyTotal>> {
        let sessions = self.current_sessions().await?;
        let today = self.calendar.day_of(self.clock.now());
        Ok(study_log::daily_totals(&sessions, &self.calendar, window, today))
    }

    pub async fn streak(&self) -> PortResult<u32> {
        let sessions = self.current_sessions().await?;
        let today = self.calendar.day_of(self.clock.now());
        Ok(study_log::streak(&sessions, &self.calendar, today))
    }

    async fn current_sessions(&self) -> PortResult<Vec<StudySession>> {
        Ok(self
            .current_user()
            .await?
            .map(|u| u.study_sessions)
            .unwrap_or_default())
    }

    //-------------------------------------------------------------------------------------
    // Dashboard
    //-------------------------------------------------------------------------------------

    /// Builds the dashboard for the current user, or from the legacy
    /// top-level `tasks`/`studySessions` documents when nobody is signed in.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> PortResult<DashboardSnapshot> {
        let now = self.clock.now();
        if let Some(user) = self.current_user().await? {
            return Ok(DashboardSnapshot::build(
                &user.tasks,
                &user.study_sessions,
                Some((&user).into()),
                now,
                &self.calendar,
            ));
        }

        debug!("no current user, using legacy top-level documents");
        let tasks: Vec<Task> = self.store.read(keys::TASKS).await?.unwrap_or_default();
        let sessions: Vec<StudySession> = self
            .store
            .read(keys::STUDY_SESSIONS)
            .await?
            .unwrap_or_default();
        Ok(DashboardSnapshot::build(
            &tasks,
            &sessions,
            None,
            now,
            &self.calendar,
        ))
    }
}
