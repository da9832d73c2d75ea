pub mod commands;
pub mod config;
pub mod events;
pub mod logging;
pub mod models;
pub mod reminder;
pub mod scheduler;
pub mod state;
pub mod storage;
pub mod store;
pub mod view;

pub use models::{Category, Priority, SortMode, Status, Task, TaskDraft, TaskFilters, TaskPatch};
pub use state::AppState;
pub use store::TaskStore;

#[cfg(all(feature = "app", not(test)))]
use std::time::Duration;

#[cfg(all(feature = "app", not(test)))]
use tauri::Manager;

#[cfg(all(feature = "app", not(test)))]
use crate::commands::*;
#[cfg(all(feature = "app", not(test)))]
use crate::config::AppConfig;
#[cfg(all(feature = "app", not(test)))]
use crate::scheduler::{notification_permission, start_dispatcher, QueueNotifier, ReminderQueue};
#[cfg(all(feature = "app", not(test)))]
use crate::storage::FileStore;

#[cfg(all(feature = "app", not(test)))]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let result = tauri::Builder::default()
        .plugin(tauri_plugin_notification::init())
        .setup(|app| {
            let data_dir = app.path().app_data_dir()?;
            if let Err(err) = logging::init_logging(&data_dir) {
                eprintln!("logging: init failed err={err}");
            }

            let config = AppConfig::load(&data_dir);
            let storage = FileStore::new(data_dir);
            storage.ensure_dirs()?;

            let queue = ReminderQueue::new();
            let handle = app.handle().clone();
            let notifier =
                QueueNotifier::new(queue.clone(), move || notification_permission(&handle));
            let state = AppState::from_parts(
                storage,
                &config.storage_key,
                notifier,
                &config.reminder_title,
            );
            app.manage(state.clone());

            reconcile_reminders(app.handle(), &state);
            start_dispatcher(
                app.handle().clone(),
                queue,
                Duration::from_secs(config.dispatch_interval_secs),
            );
            log::info!("app: started storage_key={}", config.storage_key);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            load_tasks,
            list_tasks,
            get_task,
            task_stats,
            save_task,
            update_task,
            toggle_task,
            delete_task,
        ])
        .run(tauri::generate_context!());

    if let Err(err) = result {
        log::error!("app: run failed err={err}");
        eprintln!("error while running tauri application: {err}");
    }
}
