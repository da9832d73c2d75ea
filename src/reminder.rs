//! Maps a task's reminder time onto a platform notification handle.
//!
//! Nothing in here fails loudly: a denied permission or a platform error means the
//! reminder does not fire, and the task is saved regardless.

use serde::Serialize;

use crate::models::{Task, Timestamp};

pub const DEFAULT_REMINDER_TITLE: &str = "📋 Todo Reminder";

#[derive(Debug)]
pub enum NotifyError {
    PermissionUnavailable(String),
    Platform(String),
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::PermissionUnavailable(message) => {
                write!(f, "permission unavailable: {message}")
            }
            NotifyError::Platform(message) => write!(f, "platform error: {message}"),
        }
    }
}

impl std::error::Error for NotifyError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPayload {
    pub task_id: String,
    pub title: String,
    pub body: String,
}

/// The platform notification subsystem.
pub trait Notifier {
    /// May prompt the user the first time; later calls answer from the recorded choice.
    fn request_permission(&mut self) -> Result<bool, NotifyError>;
    fn schedule_at(
        &mut self,
        at: Timestamp,
        payload: ReminderPayload,
    ) -> Result<String, NotifyError>;
    fn cancel(&mut self, handle: &str) -> Result<(), NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn request_permission(&mut self) -> Result<bool, NotifyError> {
        (**self).request_permission()
    }

    fn schedule_at(
        &mut self,
        at: Timestamp,
        payload: ReminderPayload,
    ) -> Result<String, NotifyError> {
        (**self).schedule_at(at, payload)
    }

    fn cancel(&mut self, handle: &str) -> Result<(), NotifyError> {
        (**self).cancel(handle)
    }
}

pub struct ReminderScheduler<N> {
    notifier: N,
    title: String,
}

impl<N: Notifier> ReminderScheduler<N> {
    pub fn new(notifier: N) -> Self {
        Self::with_title(notifier, DEFAULT_REMINDER_TITLE)
    }

    pub fn with_title(notifier: N, title: impl Into<String>) -> Self {
        Self {
            notifier,
            title: title.into(),
        }
    }

    /// Returns the new handle, or `None` when no reminder was set.
    pub fn schedule(&mut self, task: &Task, now: Timestamp) -> Option<String> {
        let at = task.reminder_time?;
        if at <= now || task.completed {
            return None;
        }

        self.arm(task, at)
    }

    /// A reminder that came due while nothing was running to show it. It is handed to the
    /// notifier for `now`, so it fires on the next dispatch instead of being lost.
    pub fn deliver_missed(&mut self, task: &Task, now: Timestamp) -> Option<String> {
        self.cancel(task.notification_id.as_deref());
        if task.completed || task.reminder_time.is_none() {
            return None;
        }
        log::info!("reminder: delivering missed id={}", task.id);
        self.arm(task, now)
    }

    fn arm(&mut self, task: &Task, at: Timestamp) -> Option<String> {
        match self.notifier.request_permission() {
            Ok(true) => {}
            Ok(false) => {
                log::info!("reminder: permission denied, skipping id={}", task.id);
                return None;
            }
            Err(err) => {
                log::warn!("reminder: permission check failed id={} err={err}", task.id);
                return None;
            }
        }

        let payload = ReminderPayload {
            task_id: task.id.clone(),
            title: self.title.clone(),
            body: task.title.clone(),
        };
        match self.notifier.schedule_at(at, payload) {
            Ok(handle) => {
                log::debug!("reminder: scheduled id={} at={at} handle={handle}", task.id);
                Some(handle)
            }
            Err(err) => {
                log::warn!("reminder: schedule failed id={} err={err}", task.id);
                None
            }
        }
    }

    pub fn cancel(&mut self, handle: Option<&str>) {
        let Some(handle) = handle.filter(|handle| !handle.is_empty()) else {
            return;
        };
        if let Err(err) = self.notifier.cancel(handle) {
            log::warn!("reminder: cancel failed handle={handle} err={err}");
        }
    }

    /// Cancels the task's current handle before asking for a new one, so a task never
    /// holds two live notifications.
    pub fn reschedule(&mut self, task: &Task, now: Timestamp) -> Option<String> {
        self.cancel(task.notification_id.as_deref());
        self.schedule(task, now)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Call, RecordingNotifier};
    use super::*;

    fn task_with_reminder(reminder_time: Option<Timestamp>) -> Task {
        let mut task = Task::new("water plants", 0);
        task.id = "t1".to_string();
        task.reminder_time = reminder_time;
        task
    }

    #[test]
    fn past_reminder_makes_no_platform_call() {
        let notifier = RecordingNotifier::granting();
        let mut scheduler = ReminderScheduler::new(notifier.clone());

        assert_eq!(scheduler.schedule(&task_with_reminder(Some(500)), 1_000), None);
        assert_eq!(scheduler.schedule(&task_with_reminder(Some(1_000)), 1_000), None);
        assert!(notifier.calls().is_empty());
    }

    #[test]
    fn missing_reminder_or_completed_task_is_a_no_op() {
        let notifier = RecordingNotifier::granting();
        let mut scheduler = ReminderScheduler::new(notifier.clone());

        assert_eq!(scheduler.schedule(&task_with_reminder(None), 0), None);
        let mut done = task_with_reminder(Some(5_000));
        done.completed = true;
        assert_eq!(scheduler.schedule(&done, 0), None);
        assert!(notifier.calls().is_empty());
    }

    #[test]
    fn future_reminder_is_scheduled_with_task_payload() {
        let notifier = RecordingNotifier::granting();
        let mut scheduler = ReminderScheduler::with_title(notifier.clone(), "Reminder");

        let handle = scheduler.schedule(&task_with_reminder(Some(5_000)), 1_000);
        assert_eq!(handle.as_deref(), Some("n-1"));
        assert_eq!(
            notifier.calls(),
            vec![
                Call::Permission,
                Call::Schedule(
                    5_000,
                    ReminderPayload {
                        task_id: "t1".to_string(),
                        title: "Reminder".to_string(),
                        body: "water plants".to_string(),
                    }
                ),
            ]
        );
    }

    #[test]
    fn denied_permission_yields_no_handle() {
        let notifier = RecordingNotifier::denying();
        let mut scheduler = ReminderScheduler::new(notifier.clone());

        assert_eq!(scheduler.schedule(&task_with_reminder(Some(5_000)), 0), None);
        assert_eq!(notifier.calls(), vec![Call::Permission]);
    }

    #[test]
    fn platform_failure_yields_no_handle() {
        let mut notifier = RecordingNotifier::granting();
        notifier.fail_schedule = true;
        let mut scheduler = ReminderScheduler::new(notifier.clone());

        assert_eq!(scheduler.schedule(&task_with_reminder(Some(5_000)), 0), None);
        assert_eq!(notifier.scheduled().len(), 1);
    }

    #[test]
    fn cancel_ignores_empty_handles() {
        let notifier = RecordingNotifier::granting();
        let mut scheduler = ReminderScheduler::new(notifier.clone());

        scheduler.cancel(None);
        scheduler.cancel(Some(""));
        scheduler.cancel(Some("n-9"));
        assert_eq!(notifier.cancelled(), vec!["n-9".to_string()]);
    }

    #[test]
    fn reschedule_cancels_previous_handle_first() {
        let notifier = RecordingNotifier::granting();
        let mut scheduler = ReminderScheduler::new(notifier.clone());

        let mut task = task_with_reminder(Some(5_000));
        task.notification_id = Some("old".to_string());
        let handle = scheduler.reschedule(&task, 0);

        assert_eq!(handle.as_deref(), Some("n-1"));
        let calls = notifier.calls();
        assert_eq!(calls[0], Call::Cancel("old".to_string()));
        assert!(matches!(calls.last(), Some(Call::Schedule(5_000, _))));
    }

    #[test]
    fn reschedule_of_cleared_reminder_only_cancels() {
        let notifier = RecordingNotifier::granting();
        let mut scheduler = ReminderScheduler::new(notifier.clone());

        let mut task = task_with_reminder(None);
        task.notification_id = Some("old".to_string());
        assert_eq!(scheduler.reschedule(&task, 0), None);
        assert_eq!(notifier.calls(), vec![Call::Cancel("old".to_string())]);
    }

    #[test]
    fn missed_reminder_is_handed_over_for_now() {
        let notifier = RecordingNotifier::granting();
        let mut scheduler = ReminderScheduler::new(notifier.clone());

        let mut task = task_with_reminder(Some(1_000));
        task.notification_id = Some("old".to_string());
        let handle = scheduler.deliver_missed(&task, 9_000);

        assert_eq!(handle.as_deref(), Some("n-1"));
        let calls = notifier.calls();
        assert_eq!(calls[0], Call::Cancel("old".to_string()));
        assert!(matches!(calls.last(), Some(Call::Schedule(9_000, _))));
    }

    #[test]
    fn missed_reminder_of_completed_task_is_only_cancelled() {
        let notifier = RecordingNotifier::granting();
        let mut scheduler = ReminderScheduler::new(notifier.clone());

        let mut task = task_with_reminder(Some(1_000));
        task.completed = true;
        task.notification_id = Some("old".to_string());
        assert_eq!(scheduler.deliver_missed(&task, 9_000), None);
        assert_eq!(notifier.calls(), vec![Call::Cancel("old".to_string())]);
    }
}
