use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::error::FailureKind;
use crate::models::{ReminderOption, Task, TaskListType, Timestamp};
use crate::reminder::{schedule_reminder, NotificationService};
use crate::state::{Action, AppState, HomeState};
use crate::storage::{SettingsStore, StorageError, TaskStore};

pub const NAME_WARNING_DISMISS_AFTER: Duration = Duration::from_millis(2500);

static TASK_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, serde::Serialize)]
pub struct CommandResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// Platform services a command needs. The host wires real ones, tests wire fakes.
pub trait CommandCtx {
    fn task_store(&self) -> &dyn TaskStore;
    fn settings_store(&self) -> &dyn SettingsStore;
    fn notifier(&self) -> &dyn NotificationService;
    fn emit_state_updated(&self, state: &HomeState);

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Input of the add-task form.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_at: Timestamp,
    #[serde(default = "default_reminder")]
    pub reminder: String,
}

fn default_reminder() -> String {
    ReminderOption::default().symbol().to_string()
}

fn ok<T>(data: T) -> CommandResult<T> {
    CommandResult {
        ok: true,
        data: Some(data),
        error: None,
    }
}

fn err<T>(message: &str) -> CommandResult<T> {
    CommandResult {
        ok: false,
        data: None,
        error: Some(message.to_string()),
    }
}

fn next_task_id(now: &DateTime<Local>) -> String {
    let seq = TASK_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{seq}", now.timestamp_millis())
}

fn apply(ctx: &impl CommandCtx, state: &AppState, action: Action) -> HomeState {
    let snapshot = state.dispatch(action, &ctx.now());
    ctx.emit_state_updated(&snapshot);
    snapshot
}

fn save(ctx: &impl CommandCtx, tasks: &[Task]) -> Result<(), StorageError> {
    ctx.task_store().save(tasks).map_err(|error| {
        log::error!("store: {}: {error}", FailureKind::Save);
        error
    })
}

/// The persisted set a mutation starts from. The in-memory copy may be empty after a
/// failed fetch, so it is never written back.
fn fetch_working(ctx: &impl CommandCtx) -> Result<Vec<Task>, StorageError> {
    ctx.task_store().fetch().map_err(|error| {
        log::error!("store: {}: {error}", FailureKind::Fetch);
        error
    })
}

/// Re-fetch from the store and rebuild every projection. A failed fetch leaves the
/// lists empty.
fn refresh(ctx: &impl CommandCtx, state: &AppState) -> HomeState {
    let tasks = ctx.task_store().fetch().unwrap_or_else(|error| {
        log::error!("store: {}: {error}", FailureKind::Fetch);
        Vec::new()
    });
    state.dispatch(Action::TasksChanged(tasks), &ctx.now())
}

pub fn load_state(ctx: &impl CommandCtx, state: &AppState) -> CommandResult<HomeState> {
    let tasks = ctx.task_store().fetch().unwrap_or_else(|error| {
        log::error!("store: {}: {error}", FailureKind::StoreLoad);
        Vec::new()
    });
    let user_name = match ctx.settings_store().user_name() {
        Ok(name) => name.unwrap_or_default(),
        Err(error) => {
            log::warn!("settings: failed to read user name: {error}");
            String::new()
        }
    };
    log::info!("load_state: tasks={}", tasks.len());
    ok(apply(ctx, state, Action::Loaded { tasks, user_name }))
}

pub fn add_task(ctx: &impl CommandCtx, state: &AppState, input: NewTask) -> CommandResult<Task> {
    if input.title.is_empty() || input.description.is_empty() {
        log::debug!("add_task: rejected, title and description are required");
        return err("title and description are required");
    }

    let now = ctx.now();
    let task = Task {
        id: next_task_id(&now),
        title: input.title,
        description: input.description,
        due_at: input.due_at,
        completed: false,
        created_at: now.timestamp(),
    };
    let saved = fetch_working(ctx).and_then(|mut working| {
        working.push(task.clone());
        save(ctx, &working)
    });
    if saved.is_ok() {
        schedule_reminder(ctx.notifier(), &task, &input.reminder);
    }
    refresh(ctx, state);
    apply(ctx, state, Action::AddTaskSheet(false));

    match saved {
        Ok(()) => {
            log::info!("add_task: id={} due_at={}", task.id, task.due_at);
            ok(task)
        }
        Err(error) => err(&format!("storage error: {error}")),
    }
}

pub fn complete_task(
    ctx: &impl CommandCtx,
    state: &AppState,
    task_id: &str,
) -> CommandResult<Task> {
    let mut working = match fetch_working(ctx) {
        Ok(tasks) => tasks,
        Err(error) => {
            let snapshot = refresh(ctx, state);
            ctx.emit_state_updated(&snapshot);
            return err(&format!("storage error: {error}"));
        }
    };
    let completed = working.iter_mut().find(|t| t.id == task_id).map(|task| {
        task.completed = true;
        task.clone()
    });
    let completed = match completed {
        Some(task) => task,
        None => {
            let snapshot = refresh(ctx, state);
            ctx.emit_state_updated(&snapshot);
            return err("task not found");
        }
    };

    let saved = save(ctx, &working);
    let snapshot = refresh(ctx, state);
    ctx.emit_state_updated(&snapshot);
    match saved {
        Ok(()) => {
            log::info!("complete_task: id={task_id}");
            ok(completed)
        }
        Err(error) => err(&format!("storage error: {error}")),
    }
}

pub fn delete_task(
    ctx: &impl CommandCtx,
    state: &AppState,
    task_id: &str,
) -> CommandResult<bool> {
    let mut working = match fetch_working(ctx) {
        Ok(tasks) => tasks,
        Err(error) => {
            let snapshot = refresh(ctx, state);
            ctx.emit_state_updated(&snapshot);
            return err(&format!("storage error: {error}"));
        }
    };
    let before = working.len();
    working.retain(|task| task.id != task_id);
    if working.len() == before {
        let snapshot = refresh(ctx, state);
        ctx.emit_state_updated(&snapshot);
        return err("task not found");
    }

    let saved = save(ctx, &working);
    let snapshot = refresh(ctx, state);
    ctx.emit_state_updated(&snapshot);
    match saved {
        Ok(()) => {
            log::info!("delete_task: id={task_id}");
            ok(true)
        }
        Err(error) => err(&format!("storage error: {error}")),
    }
}

pub fn set_search(
    ctx: &impl CommandCtx,
    state: &AppState,
    search: String,
) -> CommandResult<HomeState> {
    ok(apply(ctx, state, Action::SearchChanged(search)))
}

pub fn select_category(
    ctx: &impl CommandCtx,
    state: &AppState,
    category: TaskListType,
) -> CommandResult<HomeState> {
    ok(apply(ctx, state, Action::CategorySelected(category)))
}

pub fn set_user_name_sheet(
    ctx: &impl CommandCtx,
    state: &AppState,
    open: bool,
) -> CommandResult<HomeState> {
    ok(apply(ctx, state, Action::UserNameSheet(open)))
}

pub fn set_add_task_sheet(
    ctx: &impl CommandCtx,
    state: &AppState,
    open: bool,
) -> CommandResult<HomeState> {
    ok(apply(ctx, state, Action::AddTaskSheet(open)))
}

/// An empty name only raises the on-screen warning; callers are expected to follow up
/// with [`dismiss_name_warning_after`].
pub fn save_user_name(
    ctx: &impl CommandCtx,
    state: &AppState,
    name: String,
) -> CommandResult<String> {
    if name.is_empty() {
        apply(ctx, state, Action::NameWarning(true));
        return err("field should not be empty");
    }
    if let Err(error) = ctx.settings_store().set_user_name(&name) {
        log::error!("settings: {}: {error}", FailureKind::Save);
    }
    apply(ctx, state, Action::UserNameSaved(name.clone()));
    ok(name)
}

pub async fn dismiss_name_warning_after(ctx: &impl CommandCtx, state: &AppState, delay: Duration) {
    tokio::time::sleep(delay).await;
    apply(ctx, state, Action::NameWarning(false));
}
