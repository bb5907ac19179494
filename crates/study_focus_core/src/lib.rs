pub mod calendar;
pub mod dashboard;
pub mod domain;
pub mod gamification;
pub mod ledger;
pub mod ports;
pub mod repository;
pub mod session;
pub mod store;
pub mod study_log;

pub use calendar::Calendar;
pub use dashboard::{DashboardSnapshot, PlanEntry, Progress, StudyStats, TaskStats};
pub use domain::{
    Badges, NewTask, Priority, SessionPointer, StudySession, Task, TaskUpdate, UserRecord,
};
pub use gamification::{AwardEvent, AwardOutcome};
pub use ledger::{TaskFilter, TaskLedger, TaskSort, TaskView, Toggle};
pub use ports::{Clock, FixedClock, KeyValueStore, PortError, PortResult};
pub use repository::{CreateOutcome, JsonCollection, Repository, UserRepository};
pub use session::{IntervalOutcome, Session, ToggleOutcome};
pub use store::{DocumentStore, InMemoryStore};
pub use study_log::{DailyTotal, StudyLog};
