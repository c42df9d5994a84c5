use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use crate::models::Timestamp;
use crate::reminder::{
    AuthorizationOptions, AuthorizationStatus, NotificationRequest, NotificationService,
    NotifyError,
};

pub const DEFAULT_DISPATCH_INTERVAL: Duration = Duration::from_secs(1);

pub type DeliverySink = Arc<dyn Fn(&NotificationRequest) + Send + Sync>;

/// In-process notification service used by the headless host.
///
/// Holds scheduled one-shot notifications until their fire time and hands each one to the
/// delivery sink exactly once.
#[derive(Clone)]
pub struct LocalNotifier {
    inner: Arc<Mutex<NotifierData>>,
    sink: DeliverySink,
}

#[derive(Debug)]
struct NotifierData {
    status: AuthorizationStatus,
    grant_on_request: bool,
    pending: Vec<NotificationRequest>,
}

impl LocalNotifier {
    pub fn new(status: AuthorizationStatus, grant_on_request: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(NotifierData {
                status,
                grant_on_request,
                pending: Vec::new(),
            })),
            sink: Arc::new(log_delivery),
        }
    }

    pub fn with_sink(mut self, sink: DeliverySink) -> Self {
        self.sink = sink;
        self
    }

    pub fn pending(&self) -> Vec<NotificationRequest> {
        let guard = self.inner.lock().expect("notifier poisoned");
        guard.pending.clone()
    }

    /// Removes every pending notification with `fire_at <= now` and delivers it.
    pub fn deliver_due(&self, now: Timestamp) -> Vec<NotificationRequest> {
        let due = {
            let mut guard = self.inner.lock().expect("notifier poisoned");
            let (due, keep): (Vec<_>, Vec<_>) = guard
                .pending
                .drain(..)
                .partition(|request| request.fire_at <= now);
            guard.pending = keep;
            due
        };
        for request in &due {
            (self.sink)(request);
        }
        due
    }
}

impl NotificationService for LocalNotifier {
    fn authorization_status(&self) -> AuthorizationStatus {
        let guard = self.inner.lock().expect("notifier poisoned");
        guard.status
    }

    fn request_authorization(&self, options: AuthorizationOptions) -> Result<bool, NotifyError> {
        let mut guard = self.inner.lock().expect("notifier poisoned");
        log::debug!(
            "notifier: authorization requested alert={} badge={} sound={}",
            options.alert,
            options.badge,
            options.sound
        );
        guard.status = if guard.grant_on_request {
            AuthorizationStatus::Authorized
        } else {
            AuthorizationStatus::Denied
        };
        Ok(guard.grant_on_request)
    }

    fn schedule(&self, request: NotificationRequest) -> Result<(), NotifyError> {
        let mut guard = self.inner.lock().expect("notifier poisoned");
        if guard.status != AuthorizationStatus::Authorized {
            return Err(NotifyError::NotAuthorized);
        }
        // Same identifier replaces the earlier request.
        guard.pending.retain(|pending| pending.id != request.id);
        guard.pending.push(request);
        Ok(())
    }
}

fn log_delivery(request: &NotificationRequest) {
    log::info!(
        "notification: id={} title={:?} subtitle={:?} fire_at={}",
        request.id,
        request.title,
        request.subtitle,
        request.fire_at
    );
}

pub fn start_dispatcher(notifier: LocalNotifier, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let now = Utc::now().timestamp();
            let delivered = notifier.deliver_due(now);
            if !delivered.is_empty() {
                log::debug!("notifier: delivered count={}", delivered.len());
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str, fire_at: i64) -> NotificationRequest {
        NotificationRequest {
            id: id.to_string(),
            title: format!("title-{id}"),
            subtitle: "subtitle".to_string(),
            fire_at,
        }
    }

    fn recording_notifier() -> (LocalNotifier, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let notifier = LocalNotifier::new(AuthorizationStatus::Authorized, true).with_sink(
            Arc::new(move |request: &NotificationRequest| {
                sink_seen.lock().unwrap().push(request.id.clone());
            }),
        );
        (notifier, seen)
    }

    #[test]
    fn schedule_requires_authorization() {
        let notifier = LocalNotifier::new(AuthorizationStatus::NotDetermined, false);
        assert_eq!(
            notifier.schedule(request("a", 1)),
            Err(NotifyError::NotAuthorized)
        );

        assert_eq!(
            notifier.request_authorization(AuthorizationOptions::ALL),
            Ok(false)
        );
        assert_eq!(notifier.authorization_status(), AuthorizationStatus::Denied);
        assert!(notifier.pending().is_empty());
    }

    #[test]
    fn granted_request_enables_scheduling() {
        let notifier = LocalNotifier::new(AuthorizationStatus::NotDetermined, true);
        assert_eq!(
            notifier.request_authorization(AuthorizationOptions::ALL),
            Ok(true)
        );
        assert!(notifier.schedule(request("a", 1)).is_ok());
        assert_eq!(notifier.pending().len(), 1);
    }

    #[test]
    fn same_id_replaces_pending_request() {
        let (notifier, _) = recording_notifier();
        notifier.schedule(request("a", 100)).unwrap();
        notifier.schedule(request("a", 200)).unwrap();
        let pending = notifier.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].fire_at, 200);
    }

    #[test]
    fn deliver_due_is_one_shot() {
        let (notifier, seen) = recording_notifier();
        notifier.schedule(request("early", 100)).unwrap();
        notifier.schedule(request("exact", 150)).unwrap();
        notifier.schedule(request("late", 500)).unwrap();

        let delivered = notifier.deliver_due(150);
        assert_eq!(delivered.len(), 2);
        assert_eq!(*seen.lock().unwrap(), vec!["early", "exact"]);

        assert!(notifier.deliver_due(150).is_empty());
        assert_eq!(notifier.pending().len(), 1);

        notifier.deliver_due(1_000);
        assert_eq!(*seen.lock().unwrap(), vec!["early", "exact", "late"]);
        assert!(notifier.pending().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dispatcher_delivers_past_due_requests() {
        let (notifier, seen) = recording_notifier();
        let now = Utc::now().timestamp();
        notifier.schedule(request("due", now - 10)).unwrap();
        notifier.schedule(request("later", now + 86_400)).unwrap();

        let handle = start_dispatcher(notifier.clone(), Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        handle.abort();

        assert_eq!(*seen.lock().unwrap(), vec!["due"]);
        assert_eq!(notifier.pending().len(), 1);
    }
}
