pub mod classify;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod reminder;
pub mod scheduler;
pub mod state;
pub mod storage;

#[cfg(all(feature = "app", not(test)))]
use crate::commands::CommandCtx;
#[cfg(all(feature = "app", not(test)))]
use crate::config::AppConfig;
#[cfg(all(feature = "app", not(test)))]
use crate::models::TaskListType;
#[cfg(all(feature = "app", not(test)))]
use crate::reminder::{ensure_authorization, AuthorizationStatus, NotificationService};
#[cfg(all(feature = "app", not(test)))]
use crate::scheduler::{start_dispatcher, LocalNotifier};
#[cfg(all(feature = "app", not(test)))]
use crate::state::{AppState, HomeState};
#[cfg(all(feature = "app", not(test)))]
use crate::storage::{SettingsStore, Storage, TaskStore};

#[cfg(all(feature = "app", not(test)))]
struct HostCtx {
    storage: Storage,
    notifier: LocalNotifier,
}

#[cfg(all(feature = "app", not(test)))]
impl CommandCtx for HostCtx {
    fn task_store(&self) -> &dyn TaskStore {
        &self.storage
    }

    fn settings_store(&self) -> &dyn SettingsStore {
        &self.storage
    }

    fn notifier(&self) -> &dyn NotificationService {
        &self.notifier
    }

    fn emit_state_updated(&self, state: &HomeState) {
        let counts = TaskListType::ALL
            .into_iter()
            .map(|list| format!("{}={}", list.label(), state.buckets.bucket(list).len()))
            .collect::<Vec<_>>()
            .join(" ");
        log::debug!(
            "state_updated loading={} category={:?} visible={} [{counts}]",
            state.loading,
            state.category.label(),
            state.visible.len()
        );
    }
}

/// Headless host: loads the store, runs the startup permission check and delivers due
/// reminders until Ctrl-C.
#[cfg(all(feature = "app", not(test)))]
pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let storage = Storage::new(config.data_dir.clone());
    storage.ensure_dirs()?;

    let notifier = LocalNotifier::new(AuthorizationStatus::NotDetermined, true);
    let ctx = std::sync::Arc::new(HostCtx {
        storage,
        notifier: notifier.clone(),
    });
    let state = AppState::new();

    // The lists stay empty (loading) until this lands.
    let load = {
        let ctx = ctx.clone();
        let state = state.clone();
        tokio::task::spawn_blocking(move || commands::load_state(ctx.as_ref(), &state))
    };
    let auth = {
        let notifier = notifier.clone();
        let delay = config.auth_request_delay;
        tokio::spawn(async move { ensure_authorization(&notifier, delay).await })
    };
    let dispatcher = start_dispatcher(notifier, config.dispatch_interval);

    match load.await {
        Ok(result) => {
            if let Some(snapshot) = result.data {
                log::info!("{} {}", snapshot.greeting(), snapshot.today_summary());
            }
        }
        Err(err) => log::error!("load task failed: {err}"),
    }
    match auth.await {
        Ok(status) => log::info!("notifications: final status={status:?}"),
        Err(err) => log::error!("authorization task failed: {err}"),
    }

    tokio::signal::ctrl_c().await?;
    log::info!("shutting down");
    dispatcher.abort();
    Ok(())
}
