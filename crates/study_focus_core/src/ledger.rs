//! crates/study_focus_core/src/ledger.rs
//!
//! The task ledger: mutations on one user's task list and the filtered,
//! sorted views derived from it.

use crate::domain::{timestamp_id, NewTask, Task, TaskUpdate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

const TASK_ID_PREFIX: &str = "task_";

//=========================================================================================
// Mutations
//=========================================================================================

/// Result of flipping a task's completion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    /// false → true. This is the only transition that earns an award.
    Completed,
    /// true → false.
    Reopened,
}

/// Mutable access to a task list.
pub struct TaskLedger<'a> {
    tasks: &'a mut Vec<Task>,
}

impl<'a> TaskLedger<'a> {
    pub fn new(tasks: &'a mut Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Appends a new, incomplete task and returns it.
    pub fn add(&mut self, new_task: NewTask, now: DateTime<Utc>) -> &Task {
        let id = timestamp_id(
            TASK_ID_PREFIX,
            self.tasks.iter().map(|t| t.id.as_str()),
            now,
        );
        self.tasks.push(Task {
            id,
            title: new_task.title,
            description: new_task.description,
            priority: new_task.priority,
            due_date: new_task.due_date,
            completed: false,
            created_at: now,
        });
        &self.tasks[self.tasks.len() - 1]
    }

    /// Flips `completed`. `None` when no task has that id.
    pub fn toggle(&mut self, task_id: &str) -> Option<Toggle> {
        let task = self.tasks.iter_mut().find(|t| t.id == task_id)?;
        task.completed = !task.completed;
        Some(if task.completed {
            Toggle::Completed
        } else {
            Toggle::Reopened
        })
    }

    /// Returns whether a task was removed.
    pub fn remove(&mut self, task_id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != task_id);
        self.tasks.len() != before
    }

    /// Overwrites the editable fields of a task. Returns whether it was found.
    pub fn update(&mut self, task_id: &str, update: TaskUpdate) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) else {
            return false;
        };
        task.title = update.title;
        task.description = update.description;
        task.priority = update.priority;
        task.due_date = update.due_date;
        true
    }

    /// Drops every completed task, returning how many went.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        before - self.tasks.len()
    }
}

//=========================================================================================
// Views
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl TaskFilter {
    fn admits(self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Pending => !task.completed,
            TaskFilter::Completed => task.completed,
        }
    }
}

impl FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TaskFilter::All),
            "pending" => Ok(TaskFilter::Pending),
            "completed" => Ok(TaskFilter::Completed),
            other => Err(format!("unknown task filter '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskSort {
    #[default]
    #[serde(rename = "date-asc")]
    DueAsc,
    #[serde(rename = "date-desc")]
    DueDesc,
    PriorityDesc,
    PriorityAsc,
}

impl TaskSort {
    fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            TaskSort::DueAsc => by_due(a, b, false),
            TaskSort::DueDesc => by_due(a, b, true),
            TaskSort::PriorityDesc => b.priority.weight().cmp(&a.priority.weight()),
            TaskSort::PriorityAsc => a.priority.weight().cmp(&b.priority.weight()),
        }
    }
}

impl FromStr for TaskSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date-asc" | "due-asc" => Ok(TaskSort::DueAsc),
            "date-desc" | "due-desc" => Ok(TaskSort::DueDesc),
            "priority-desc" => Ok(TaskSort::PriorityDesc),
            "priority-asc" => Ok(TaskSort::PriorityAsc),
            other => Err(format!("unknown task sort '{other}'")),
        }
    }
}

/// Undated tasks go last in both directions.
fn by_due(a: &Task, b: &Task, descending: bool) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(x), Some(y)) if descending => y.cmp(&x),
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Ordering used for planning: priority desc, then due date asc, undated last.
pub fn planning_order(a: &Task, b: &Task) -> Ordering {
    b.priority
        .weight()
        .cmp(&a.priority.weight())
        .then_with(|| by_due(a, b, false))
}

/// A filtered and sorted view over a task list.
///
/// Nothing is computed until it is iterated, and it can be iterated any
/// number of times. Ties keep their list order.
#[derive(Debug, Clone, Copy)]
pub struct TaskView<'a> {
    tasks: &'a [Task],
    filter: TaskFilter,
    sort: TaskSort,
}

impl<'a> TaskView<'a> {
    pub fn iter(&self) -> std::vec::IntoIter<&'a Task> {
        let mut selected: Vec<&'a Task> = self
            .tasks
            .iter()
            .filter(|t| self.filter.admits(t))
            .collect();
        selected.sort_by(|a, b| self.sort.compare(a, b));
        selected.into_iter()
    }
}

impl<'a> IntoIterator for &TaskView<'a> {
    type Item = &'a Task;
    type IntoIter = std::vec::IntoIter<&'a Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Filter first, then sort.
pub fn view(tasks: &[Task], filter: TaskFilter, sort: TaskSort) -> TaskView<'_> {
    TaskView {
        tasks,
        filter,
        sort,
    }
}

/// Incomplete tasks in planning order.
pub fn planning_view(tasks: &[Task]) -> Vec<&Task> {
    let mut pending: Vec<&Task> = tasks.iter().filter(|t| !t.completed).collect();
    pending.sort_by(|a, b| planning_order(a, b));
    pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Priority;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn task(id: &str, priority: Priority, due: Option<DateTime<Utc>>) -> Task {
        Task {
            id: id.to_string(),
            title: id.to_string(),
            description: None,
            priority,
            due_date: due,
            completed: false,
            created_at: at(2024, 1, 1),
        }
    }

    fn ids<'a>(view: &TaskView<'a>) -> Vec<&'a str> {
        view.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn undated_tasks_sort_last_in_both_directions() {
        let tasks = vec![
            task("jan5", Priority::Medium, Some(at(2024, 1, 5))),
            task("none", Priority::Medium, None),
            task("jan1", Priority::Medium, Some(at(2024, 1, 1))),
        ];

        let asc = view(&tasks, TaskFilter::Pending, TaskSort::DueAsc);
        assert_eq!(ids(&asc), vec!["jan1", "jan5", "none"]);

        let desc = view(&tasks, TaskFilter::Pending, TaskSort::DueDesc);
        assert_eq!(ids(&desc), vec!["jan5", "jan1", "none"]);
    }

    #[test]
    fn priority_sorts_are_stable() {
        let tasks = vec![
            task("a", Priority::Low, None),
            task("b", Priority::High, None),
            task("c", Priority::Medium, None),
            task("d", Priority::High, None),
        ];

        let desc = view(&tasks, TaskFilter::All, TaskSort::PriorityDesc);
        assert_eq!(ids(&desc), vec!["b", "d", "c", "a"]);

        let asc = view(&tasks, TaskFilter::All, TaskSort::PriorityAsc);
        assert_eq!(ids(&asc), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn filter_applies_before_sort() {
        let mut tasks = vec![
            task("a", Priority::Low, None),
            task("b", Priority::High, None),
        ];
        tasks[1].completed = true;

        let pending = view(&tasks, TaskFilter::Pending, TaskSort::PriorityDesc);
        assert_eq!(ids(&pending), vec!["a"]);
        let done = view(&tasks, TaskFilter::Completed, TaskSort::PriorityDesc);
        assert_eq!(ids(&done), vec!["b"]);
    }

    #[test]
    fn views_can_be_iterated_repeatedly() {
        let tasks = vec![task("a", Priority::Low, None), task("b", Priority::High, None)];
        let v = view(&tasks, TaskFilter::All, TaskSort::PriorityDesc);
        let first: Vec<_> = (&v).into_iter().map(|t| t.id.clone()).collect();
        let second: Vec<_> = (&v).into_iter().map(|t| t.id.clone()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn planning_order_breaks_priority_ties_by_due_date() {
        let tasks = vec![
            task("high-undated", Priority::High, None),
            task("high-late", Priority::High, Some(at(2024, 2, 1))),
            task("low", Priority::Low, Some(at(2024, 1, 1))),
            task("high-early", Priority::High, Some(at(2024, 1, 2))),
        ];
        let order: Vec<_> = planning_view(&tasks).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec!["high-early", "high-late", "high-undated", "low"]);
    }

    #[test]
    fn toggle_reports_transitions() {
        let mut tasks = vec![task("a", Priority::Low, None)];
        let mut ledger = TaskLedger::new(&mut tasks);

        assert_eq!(ledger.toggle("a"), Some(Toggle::Completed));
        assert_eq!(ledger.toggle("a"), Some(Toggle::Reopened));
        assert_eq!(ledger.toggle("missing"), None);
    }

    #[test]
    fn add_update_remove_and_clear() {
        let mut tasks = Vec::new();
        let mut ledger = TaskLedger::new(&mut tasks);
        let now = at(2024, 1, 1);

        let first = ledger.add(NewTask::new("Essay", Priority::High), now).id.clone();
        let second = ledger.add(NewTask::new("Quiz", Priority::Low), now).id.clone();
        assert_ne!(first, second);

        assert!(ledger.update(
            &first,
            TaskUpdate {
                title: "Essay draft".into(),
                description: Some("two pages".into()),
                priority: Priority::Medium,
                due_date: Some(at(2024, 1, 3)),
            }
        ));
        assert!(!ledger.update(
            "missing",
            TaskUpdate {
                title: "x".into(),
                description: None,
                priority: Priority::Low,
                due_date: None,
            }
        ));

        ledger.toggle(&second);
        assert_eq!(ledger.clear_completed(), 1);
        assert!(!ledger.remove("missing"));
        assert!(ledger.remove(&first));
        assert!(tasks.is_empty());
    }

    #[test]
    fn parses_sort_tokens() {
        assert_eq!("date-asc".parse::<TaskSort>(), Ok(TaskSort::DueAsc));
        assert_eq!("priority-desc".parse::<TaskSort>(), Ok(TaskSort::PriorityDesc));
        assert_eq!("pending".parse::<TaskFilter>(), Ok(TaskFilter::Pending));
    }
}
