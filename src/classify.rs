//! Splits the task list into the "Due Today", "Upcoming" and "Completed" buckets and
//! derives the list currently on screen.

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::models::{Task, TaskListType};

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Buckets {
    pub due_today: Vec<Task>,
    pub upcoming: Vec<Task>,
    pub completed: Vec<Task>,
}

impl Buckets {
    pub fn bucket(&self, list: TaskListType) -> &[Task] {
        match list {
            TaskListType::DueToday => &self.due_today,
            TaskListType::Upcoming => &self.upcoming,
            TaskListType::Completed => &self.completed,
        }
    }

    pub fn due_today_count(&self) -> usize {
        self.due_today.len()
    }
}

/// Partition `tasks` as seen at `now`.
///
/// Completed tasks go to `completed`. Open tasks due on the same calendar day as `now`
/// (in `now`'s time zone) are appended to `due_today`; open tasks already past due on an
/// earlier day are inserted at the front of `due_today`; everything else is `upcoming`.
/// Input order is preserved within each rule.
pub fn classify<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> Buckets {
    let today = now.date_naive();
    let now_ts = now.timestamp();
    let zone = now.timezone();

    let mut buckets = Buckets::default();
    for task in tasks {
        if task.completed {
            buckets.completed.push(task.clone());
            continue;
        }
        let due_day = zone
            .timestamp_opt(task.due_at, 0)
            .single()
            .map(|due| due.date_naive());
        if due_day == Some(today) {
            buckets.due_today.push(task.clone());
        } else if task.due_at < now_ts {
            buckets.due_today.insert(0, task.clone());
        } else {
            buckets.upcoming.push(task.clone());
        }
    }
    buckets
}

/// Case-sensitive title match, scoped to a single bucket. An empty search keeps the
/// bucket as is.
pub fn filter_by_title(tasks: &[Task], search: &str) -> Vec<Task> {
    if search.is_empty() {
        return tasks.to_vec();
    }
    tasks
        .iter()
        .filter(|task| task.title.contains(search))
        .cloned()
        .collect()
}

pub fn visible_tasks(buckets: &Buckets, list: TaskListType, search: &str) -> Vec<Task> {
    filter_by_title(buckets.bucket(list), search)
}
