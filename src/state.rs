use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::classify::{classify, visible_tasks, Buckets};
use crate::models::{Task, TaskListType};

/// Everything the home screen renders, as one snapshot.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct HomeState {
    pub loading: bool,
    pub user_name: String,
    pub tasks: Vec<Task>,
    pub buckets: Buckets,
    pub category: TaskListType,
    pub search: String,
    /// Whether `visible` is the search-filtered bucket. Selecting a category shows the
    /// bucket unfiltered until the search text is edited again.
    pub filter_active: bool,
    pub visible: Vec<Task>,
    pub user_name_sheet_open: bool,
    pub add_task_sheet_open: bool,
    pub name_warning_visible: bool,
}

impl Default for HomeState {
    fn default() -> Self {
        Self {
            loading: true,
            user_name: String::new(),
            tasks: Vec::new(),
            buckets: Buckets::default(),
            category: TaskListType::DueToday,
            search: String::new(),
            filter_active: false,
            visible: Vec::new(),
            user_name_sheet_open: false,
            add_task_sheet_open: false,
            name_warning_visible: false,
        }
    }
}

impl HomeState {
    pub fn due_today_count(&self) -> usize {
        self.buckets.due_today_count()
    }

    pub fn greeting(&self) -> String {
        if self.user_name.is_empty() {
            "Tap to enter your name".to_string()
        } else {
            format!("Hey {},", self.user_name)
        }
    }

    pub fn today_summary(&self) -> String {
        format!("{} tasks for today", self.due_today_count())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Loaded { tasks: Vec<Task>, user_name: String },
    TasksChanged(Vec<Task>),
    SearchChanged(String),
    CategorySelected(TaskListType),
    UserNameSaved(String),
    NameWarning(bool),
    UserNameSheet(bool),
    AddTaskSheet(bool),
}

/// Pure transition: the previous snapshot is left untouched.
pub fn reduce<Tz: TimeZone>(state: &HomeState, action: Action, now: &DateTime<Tz>) -> HomeState {
    let mut next = state.clone();
    match action {
        Action::Loaded { tasks, user_name } => {
            next.loading = false;
            next.user_name = user_name;
            next.tasks = tasks;
            recompute(&mut next, now);
        }
        Action::TasksChanged(tasks) => {
            next.tasks = tasks;
            recompute(&mut next, now);
        }
        Action::SearchChanged(search) => {
            next.filter_active = !search.is_empty();
            next.visible = visible_tasks(&next.buckets, next.category, &search);
            next.search = search;
        }
        Action::CategorySelected(category) => {
            next.category = category;
            next.filter_active = false;
            next.visible = next.buckets.bucket(category).to_vec();
        }
        Action::UserNameSaved(name) => {
            next.user_name = name;
            next.user_name_sheet_open = false;
            next.name_warning_visible = false;
        }
        Action::NameWarning(visible) => next.name_warning_visible = visible,
        Action::UserNameSheet(open) => next.user_name_sheet_open = open,
        Action::AddTaskSheet(open) => next.add_task_sheet_open = open,
    }
    next
}

fn recompute<Tz: TimeZone>(state: &mut HomeState, now: &DateTime<Tz>) {
    state.buckets = classify(&state.tasks, now);
    let search = if state.filter_active {
        state.search.as_str()
    } else {
        ""
    };
    state.visible = visible_tasks(&state.buckets, state.category, search);
}

/// Shared handle to the current snapshot; actions replace it wholesale.
#[derive(Clone, Default)]
pub struct AppState {
    inner: Arc<Mutex<HomeState>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> HomeState {
        let guard = self.inner.lock().expect("state poisoned");
        guard.clone()
    }

    pub fn dispatch<Tz: TimeZone>(&self, action: Action, now: &DateTime<Tz>) -> HomeState {
        let mut guard = self.inner.lock().expect("state poisoned");
        let next = reduce(&guard, action, now);
        *guard = next.clone();
        next
    }
}
