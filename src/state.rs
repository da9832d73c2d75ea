use std::sync::{Arc, Mutex, MutexGuard};

use crate::reminder::{Notifier, ReminderScheduler};
use crate::storage::KeyValueStore;
use crate::store::TaskStore;

pub type SharedStore = TaskStore<Box<dyn KeyValueStore + Send>>;
pub type SharedReminders = ReminderScheduler<Box<dyn Notifier + Send>>;

/// Store and reminder scheduler behind one lock, so a load-mutate-save cycle and its
/// reminder bookkeeping run as a unit.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Mutex<AppData>>,
}

pub struct AppData {
    pub store: SharedStore,
    pub reminders: SharedReminders,
}

impl AppState {
    pub fn new(store: SharedStore, reminders: SharedReminders) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AppData { store, reminders })),
        }
    }

    /// Builds the state from concrete backends.
    pub fn from_parts(
        backend: impl KeyValueStore + Send + 'static,
        storage_key: &str,
        notifier: impl Notifier + Send + 'static,
        reminder_title: &str,
    ) -> Self {
        let backend: Box<dyn KeyValueStore + Send> = Box::new(backend);
        let notifier: Box<dyn Notifier + Send> = Box::new(notifier);
        Self::new(
            TaskStore::with_key(backend, storage_key),
            ReminderScheduler::with_title(notifier, reminder_title),
        )
    }

    /// The data is plain values, so a panic in another holder leaves nothing half-built
    /// worth refusing over.
    pub fn lock(&self) -> MutexGuard<'_, AppData> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
