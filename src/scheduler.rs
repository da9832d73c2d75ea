use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::models::Timestamp;
use crate::reminder::{Notifier, NotifyError, ReminderPayload};

#[cfg(all(feature = "app", not(test)))]
use std::time::Duration;

#[cfg(all(feature = "app", not(test)))]
use chrono::Utc;
#[cfg(all(feature = "app", not(test)))]
use tauri::{AppHandle, Emitter, Runtime};
#[cfg(all(feature = "app", not(test)))]
use tauri_plugin_notification::NotificationExt;

#[cfg(all(feature = "app", not(test)))]
use crate::commands::mark_reminders_fired;
#[cfg(all(feature = "app", not(test)))]
use crate::events::EVENT_REMINDER;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingReminder {
    pub handle: String,
    pub fire_at: Timestamp,
    pub payload: ReminderPayload,
}

/// Reminders waiting to fire inside this process.
#[derive(Clone, Default)]
pub struct ReminderQueue {
    inner: Arc<Mutex<Vec<PendingReminder>>>,
}

impl ReminderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles stay unique across launches, so a stale handle persisted by an earlier run
    /// can never cancel a fresh reminder.
    pub fn push(&self, fire_at: Timestamp, payload: ReminderPayload) -> String {
        let handle = format!("r-{}", uuid::Uuid::new_v4().simple());
        self.lock().push(PendingReminder {
            handle: handle.clone(),
            fire_at,
            payload,
        });
        handle
    }

    pub fn cancel(&self, handle: &str) -> bool {
        let mut pending = self.lock();
        let before = pending.len();
        pending.retain(|reminder| reminder.handle != handle);
        pending.len() != before
    }

    /// Removes and returns every reminder due at `now`, earliest first.
    pub fn take_due(&self, now: Timestamp) -> Vec<PendingReminder> {
        let mut pending = self.lock();
        let (mut due, rest): (Vec<_>, Vec<_>) = pending
            .drain(..)
            .partition(|reminder| reminder.fire_at <= now);
        *pending = rest;
        due.sort_by_key(|reminder| reminder.fire_at);
        due
    }

    pub fn pending(&self) -> Vec<PendingReminder> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PendingReminder>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

type PermissionSource = Box<dyn FnMut() -> Result<bool, NotifyError> + Send>;

/// [`Notifier`] backed by a [`ReminderQueue`]; something else drains the queue and shows
/// the notifications.
pub struct QueueNotifier {
    queue: ReminderQueue,
    permission: PermissionSource,
}

impl QueueNotifier {
    pub fn new(
        queue: ReminderQueue,
        permission: impl FnMut() -> Result<bool, NotifyError> + Send + 'static,
    ) -> Self {
        Self {
            queue,
            permission: Box::new(permission),
        }
    }

    pub fn always_granted(queue: ReminderQueue) -> Self {
        Self::new(queue, || Ok(true))
    }
}

impl Notifier for QueueNotifier {
    fn request_permission(&mut self) -> Result<bool, NotifyError> {
        (self.permission)()
    }

    fn schedule_at(
        &mut self,
        at: Timestamp,
        payload: ReminderPayload,
    ) -> Result<String, NotifyError> {
        Ok(self.queue.push(at, payload))
    }

    fn cancel(&mut self, handle: &str) -> Result<(), NotifyError> {
        if !self.queue.cancel(handle) {
            log::debug!("scheduler: cancel of unknown handle={handle}");
        }
        Ok(())
    }
}

/// Asks the OS once; later calls read the recorded answer.
#[cfg(all(feature = "app", not(test)))]
pub fn notification_permission<R: Runtime>(app: &AppHandle<R>) -> Result<bool, NotifyError> {
    use tauri::plugin::PermissionState;

    let notification = app.notification();
    let state = notification
        .permission_state()
        .map_err(|err| NotifyError::PermissionUnavailable(err.to_string()))?;
    let state = match state {
        PermissionState::Granted | PermissionState::Denied => state,
        _ => notification
            .request_permission()
            .map_err(|err| NotifyError::PermissionUnavailable(err.to_string()))?,
    };
    Ok(matches!(state, PermissionState::Granted))
}

#[cfg(all(feature = "app", not(test)))]
pub fn start_dispatcher<R: Runtime>(app: AppHandle<R>, queue: ReminderQueue, every: Duration) {
    tauri::async_runtime::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let due = queue.take_due(Utc::now().timestamp_millis());
            if due.is_empty() {
                continue;
            }
            for reminder in &due {
                log::info!(
                    "scheduler: firing handle={} id={}",
                    reminder.handle,
                    reminder.payload.task_id
                );
                if let Err(err) = app
                    .notification()
                    .builder()
                    .title(reminder.payload.title.clone())
                    .body(reminder.payload.body.clone())
                    .show()
                {
                    log::warn!("scheduler: notification failed handle={} err={err}", reminder.handle);
                }
            }
            mark_reminders_fired(&app, &due);
            let _ = app.emit(EVENT_REMINDER, due);
        }
    });
}
