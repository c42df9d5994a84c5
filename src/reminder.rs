use std::time::Duration;

use serde::Serialize;

use crate::error::FailureKind;
use crate::models::{ReminderOption, Task, Timestamp};

pub const DEFAULT_AUTHORIZATION_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    NotDetermined,
    Denied,
    Authorized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationOptions {
    pub alert: bool,
    pub badge: bool,
    pub sound: bool,
}

impl AuthorizationOptions {
    pub const ALL: AuthorizationOptions = AuthorizationOptions {
        alert: true,
        badge: true,
        sound: true,
    };
}

/// A one-shot local notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct NotificationRequest {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub fire_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    NotAuthorized,
    Unavailable(String),
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::NotAuthorized => write!(f, "notifications not authorized"),
            NotifyError::Unavailable(message) => {
                write!(f, "notification service unavailable: {message}")
            }
        }
    }
}

impl std::error::Error for NotifyError {}

pub trait NotificationService: Send + Sync {
    fn authorization_status(&self) -> AuthorizationStatus;
    fn request_authorization(&self, options: AuthorizationOptions) -> Result<bool, NotifyError>;
    fn schedule(&self, request: NotificationRequest) -> Result<(), NotifyError>;
}

pub fn offset_for_symbol(symbol: &str) -> i64 {
    ReminderOption::from_symbol(symbol)
        .map(ReminderOption::offset_secs)
        .unwrap_or(0)
}

/// Unknown symbols fire at the due time itself.
pub fn fire_timestamp(symbol: &str, due_at: Timestamp) -> Timestamp {
    due_at.saturating_sub(offset_for_symbol(symbol))
}

pub fn reminder_request(task: &Task, symbol: &str) -> NotificationRequest {
    NotificationRequest {
        id: task.id.clone(),
        title: task.title.clone(),
        subtitle: task.description.clone(),
        fire_at: fire_timestamp(symbol, task.due_at),
    }
}

/// Fire-and-forget: a failed schedule is logged and otherwise ignored.
pub fn schedule_reminder(service: &dyn NotificationService, task: &Task, symbol: &str) {
    if ReminderOption::from_symbol(symbol).is_none() {
        log::debug!("reminder: unknown option={symbol:?} task_id={}, firing at due time", task.id);
    }
    let request = reminder_request(task, symbol);
    let fire_at = request.fire_at;
    match service.schedule(request) {
        Ok(()) => log::info!("reminder: scheduled task_id={} fire_at={fire_at}", task.id),
        Err(err) => log::warn!("reminder: schedule failed task_id={}: {err}", task.id),
    }
}

/// Startup permission check. Anything short of `Authorized` triggers a request after
/// `delay`; the request result is only logged.
pub async fn ensure_authorization(
    service: &dyn NotificationService,
    delay: Duration,
) -> AuthorizationStatus {
    let status = service.authorization_status();
    log::info!("notifications: authorization status={status:?}");
    if status == AuthorizationStatus::Authorized {
        return status;
    }

    tokio::time::sleep(delay).await;
    match service.request_authorization(AuthorizationOptions::ALL) {
        Ok(true) => log::info!("notifications: authorization granted"),
        Ok(false) => log::warn!("notifications: authorization declined"),
        Err(err) => log::error!(
            "notifications: {}: authorization request failed: {err}",
            FailureKind::NotificationAuth
        ),
    }
    service.authorization_status()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeService {
        status: Mutex<AuthorizationStatus>,
        grant: Result<bool, NotifyError>,
        requests: Mutex<Vec<AuthorizationOptions>>,
        scheduled: Mutex<Vec<NotificationRequest>>,
        schedule_error: Option<NotifyError>,
    }

    impl FakeService {
        fn new(status: AuthorizationStatus) -> Self {
            Self {
                status: Mutex::new(status),
                grant: Ok(true),
                requests: Mutex::new(Vec::new()),
                scheduled: Mutex::new(Vec::new()),
                schedule_error: None,
            }
        }
    }

    impl NotificationService for FakeService {
        fn authorization_status(&self) -> AuthorizationStatus {
            *self.status.lock().unwrap()
        }

        fn request_authorization(
            &self,
            options: AuthorizationOptions,
        ) -> Result<bool, NotifyError> {
            self.requests.lock().unwrap().push(options);
            if let Ok(true) = self.grant {
                *self.status.lock().unwrap() = AuthorizationStatus::Authorized;
            }
            self.grant.clone()
        }

        fn schedule(&self, request: NotificationRequest) -> Result<(), NotifyError> {
            if let Some(error) = &self.schedule_error {
                return Err(error.clone());
            }
            self.scheduled.lock().unwrap().push(request);
            Ok(())
        }
    }

    fn make_task(due_at: i64) -> Task {
        Task {
            id: "t1".to_string(),
            title: "Pay rent".to_string(),
            description: "before noon".to_string(),
            due_at,
            completed: false,
            created_at: 1,
        }
    }

    #[test]
    fn fire_timestamp_offsets_are_exact() {
        let due = 1_700_000_000;
        assert_eq!(fire_timestamp("fiveMinutesBefore", due), due - 300);
        assert_eq!(fire_timestamp("thirtyMinutesBefore", due), due - 1800);
        assert_eq!(fire_timestamp("oneHourBefore", due), due - 3600);
        assert_eq!(fire_timestamp("oneDayBefore", due), due - 86400);
        assert_eq!(fire_timestamp("oneWeekBefore", due), due - 604800);
        assert_eq!(fire_timestamp("whenever", due), due);
        assert_eq!(fire_timestamp("FiveMinutesBefore", due), due);
    }

    #[test]
    fn fire_timestamp_saturates_at_the_earliest_instant() {
        assert_eq!(fire_timestamp("oneWeekBefore", i64::MIN + 1), i64::MIN);
        assert_eq!(fire_timestamp("fiveMinutesBefore", i64::MIN), i64::MIN);
        assert_eq!(fire_timestamp("oneDayBefore", i64::MAX), i64::MAX - 86_400);
    }

    #[test]
    fn reminder_request_carries_title_and_description() {
        let request = reminder_request(&make_task(10_000), "oneHourBefore");
        assert_eq!(request.id, "t1");
        assert_eq!(request.title, "Pay rent");
        assert_eq!(request.subtitle, "before noon");
        assert_eq!(request.fire_at, 10_000 - 3600);
    }

    #[test]
    fn schedule_reminder_swallows_service_errors() {
        let mut service = FakeService::new(AuthorizationStatus::Denied);
        service.schedule_error = Some(NotifyError::NotAuthorized);
        schedule_reminder(&service, &make_task(10_000), "fiveMinutesBefore");
        assert!(service.scheduled.lock().unwrap().is_empty());

        service.schedule_error = None;
        schedule_reminder(&service, &make_task(10_000), "fiveMinutesBefore");
        assert_eq!(service.scheduled.lock().unwrap()[0].fire_at, 10_000 - 300);
    }

    #[tokio::test(start_paused = true)]
    async fn authorized_status_skips_request() {
        let service = FakeService::new(AuthorizationStatus::Authorized);
        let status = ensure_authorization(&service, Duration::from_secs(5)).await;
        assert_eq!(status, AuthorizationStatus::Authorized);
        assert!(service.requests.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn undetermined_status_requests_after_delay() {
        let service = FakeService::new(AuthorizationStatus::NotDetermined);
        let started = tokio::time::Instant::now();
        let status = ensure_authorization(&service, Duration::from_secs(2)).await;
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(status, AuthorizationStatus::Authorized);
        assert_eq!(
            *service.requests.lock().unwrap(),
            vec![AuthorizationOptions::ALL]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn denied_status_is_asked_again_and_failures_are_swallowed() {
        let mut service = FakeService::new(AuthorizationStatus::Denied);
        service.grant = Err(NotifyError::Unavailable("offline".to_string()));
        let status = ensure_authorization(&service, DEFAULT_AUTHORIZATION_DELAY).await;
        assert_eq!(status, AuthorizationStatus::Denied);
        assert_eq!(service.requests.lock().unwrap().len(), 1);
    }
}
