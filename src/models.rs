use serde::{Deserialize, Serialize};

pub type Timestamp = i64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_at: Timestamp,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub created_at: Timestamp,
}

/// Lead time before the due date at which a reminder fires.
///
/// Chosen once when a task is created and never persisted with it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ReminderOption {
    #[default]
    FiveMinutesBefore,
    ThirtyMinutesBefore,
    OneHourBefore,
    OneDayBefore,
    OneWeekBefore,
}

impl ReminderOption {
    pub const ALL: [ReminderOption; 5] = [
        ReminderOption::FiveMinutesBefore,
        ReminderOption::ThirtyMinutesBefore,
        ReminderOption::OneHourBefore,
        ReminderOption::OneDayBefore,
        ReminderOption::OneWeekBefore,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            ReminderOption::FiveMinutesBefore => "fiveMinutesBefore",
            ReminderOption::ThirtyMinutesBefore => "thirtyMinutesBefore",
            ReminderOption::OneHourBefore => "oneHourBefore",
            ReminderOption::OneDayBefore => "oneDayBefore",
            ReminderOption::OneWeekBefore => "oneWeekBefore",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|option| option.symbol() == symbol)
    }

    pub fn offset_secs(self) -> i64 {
        match self {
            ReminderOption::FiveMinutesBefore => 5 * 60,
            ReminderOption::ThirtyMinutesBefore => 30 * 60,
            ReminderOption::OneHourBefore => 60 * 60,
            ReminderOption::OneDayBefore => 24 * 60 * 60,
            ReminderOption::OneWeekBefore => 7 * 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskListType {
    #[default]
    DueToday,
    Upcoming,
    Completed,
}

impl TaskListType {
    pub const ALL: [TaskListType; 3] = [
        TaskListType::DueToday,
        TaskListType::Upcoming,
        TaskListType::Completed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TaskListType::DueToday => "Due Today",
            TaskListType::Upcoming => "Upcoming",
            TaskListType::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Settings {
    #[serde(default)]
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TasksFile {
    pub schema_version: u32,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SettingsFile {
    pub schema_version: u32,
    pub settings: Settings,
}
