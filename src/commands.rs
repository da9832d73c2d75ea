use crate::events::StatePayload;
use crate::models::{new_task_id, SortMode, Task, TaskDraft, TaskFilters, TaskPatch, Timestamp};
use crate::scheduler::PendingReminder;
use crate::state::{AppData, AppState, SharedStore};
use crate::view::{self, TaskListItem, TaskStats};

#[cfg(all(feature = "app", not(test)))]
use crate::events::EVENT_STATE_UPDATED;
#[cfg(all(feature = "app", not(test)))]
use chrono::Utc;
#[cfg(all(feature = "app", not(test)))]
use tauri::{AppHandle, Emitter, Runtime, State};

#[derive(Debug, serde::Serialize)]
pub struct CommandResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// What a command needs from the host shell.
pub trait CommandCtx {
    fn now(&self) -> Timestamp;
    fn emit_state_updated(&self, payload: StatePayload);
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

fn publish(ctx: &impl CommandCtx, store: &SharedStore) {
    ctx.emit_state_updated(StatePayload {
        tasks: store.load_all(),
    });
}

pub fn load_tasks_impl(state: &AppState) -> CommandResult<Vec<Task>> {
    ok(state.lock().store.load_all())
}

pub fn list_tasks_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    filters: TaskFilters,
    sort: SortMode,
) -> CommandResult<Vec<TaskListItem>> {
    let tasks = state.lock().store.load_all();
    ok(view::list(&tasks, &filters, sort, ctx.now()))
}

pub fn get_task_impl(state: &AppState, task_id: String) -> CommandResult<Option<Task>> {
    ok(state.lock().store.get(&task_id))
}

pub fn task_stats_impl(ctx: &impl CommandCtx, state: &AppState) -> CommandResult<TaskStats> {
    let tasks = state.lock().store.load_all();
    ok(view::aggregate(&tasks, ctx.now()))
}

/// Create (`draft.id == None`) or edit. Editing an id that no longer exists saves nothing
/// and returns no task.
pub fn save_task_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    draft: TaskDraft,
) -> CommandResult<Option<Task>> {
    let title = draft.title.trim().to_string();
    if title.is_empty() {
        return err("title is required");
    }
    let description = draft
        .description
        .as_deref()
        .map(str::trim)
        .filter(|description| !description.is_empty())
        .map(str::to_string);

    let now = ctx.now();
    let mut guard = state.lock();
    let AppData { store, reminders } = &mut *guard;

    let existing = match &draft.id {
        Some(id) => match store.get(id) {
            Some(task) => Some(task),
            None => {
                log::debug!("commands: save skipped, id={id} not found");
                return ok(None);
            }
        },
        None => None,
    };

    let mut task = Task {
        id: existing
            .as_ref()
            .map(|task| task.id.clone())
            .unwrap_or_else(|| new_task_id(now)),
        title,
        description,
        completed: draft.status.is_completed(),
        priority: draft.priority,
        category: draft.category,
        status: draft.status,
        deadline: draft.deadline,
        reminder_time: draft.reminder_time,
        created_at: existing.as_ref().map_or(now, |task| task.created_at),
        updated_at: now,
        notification_id: existing
            .as_ref()
            .and_then(|task| task.notification_id.clone()),
    };
    task.notification_id = reminders.reschedule(&task, now);

    if existing.is_some() {
        log::info!("commands: update id={}", task.id);
        store.update(&task.id, TaskPatch::from(&task), now);
    } else {
        log::info!("commands: create id={}", task.id);
        store.add(task.clone());
    }

    let saved = store.get(&task.id).unwrap_or(task);
    publish(ctx, store);
    ok(Some(saved))
}

pub fn update_task_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    task_id: String,
    patch: TaskPatch,
) -> CommandResult<Option<Task>> {
    // Title is the notification body, so it counts as reminder-relevant too.
    let touches_reminder = patch.notification_id.is_none()
        && (patch.reminder_time.is_some()
            || patch.completed.is_some()
            || patch.status.is_some()
            || patch.title.is_some());

    let now = ctx.now();
    let mut guard = state.lock();
    let AppData { store, reminders } = &mut *guard;

    store.update(&task_id, patch, now);
    let Some(task) = store.get(&task_id) else {
        return ok(None);
    };

    if touches_reminder {
        let handle = reminders.reschedule(&task, now);
        if handle != task.notification_id {
            store.update(&task_id, TaskPatch::notification(handle), now);
        }
    }

    publish(ctx, store);
    ok(store.get(&task_id))
}

/// Completing a task drops its reminder; reopening one re-arms it if still in the future.
pub fn toggle_task_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    task_id: String,
) -> CommandResult<Option<Task>> {
    let now = ctx.now();
    let mut guard = state.lock();
    let AppData { store, reminders } = &mut *guard;

    store.toggle_completion(&task_id, now);
    let Some(task) = store.get(&task_id) else {
        return ok(None);
    };

    let handle = if task.completed {
        reminders.cancel(task.notification_id.as_deref());
        None
    } else {
        reminders.reschedule(&task, now)
    };
    if handle != task.notification_id {
        store.update(&task_id, TaskPatch::notification(handle), now);
    }

    publish(ctx, store);
    ok(store.get(&task_id))
}

/// `false` when there was nothing to delete.
pub fn delete_task_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    task_id: String,
) -> CommandResult<bool> {
    let mut guard = state.lock();
    let AppData { store, reminders } = &mut *guard;

    let Some(task) = store.get(&task_id) else {
        return ok(false);
    };
    reminders.cancel(task.notification_id.as_deref());
    store.delete(&task_id);
    log::info!("commands: delete id={task_id}");

    publish(ctx, store);
    ok(true)
}

/// Re-arms every task's reminder against the live notifier, e.g. at startup when the
/// persisted handles belong to a previous process. A task still holding a handle whose
/// reminder time has passed was never shown, so it is delivered now. Returns how many
/// are armed.
pub fn reconcile_reminders_impl(ctx: &impl CommandCtx, state: &AppState) -> CommandResult<usize> {
    let now = ctx.now();
    let mut guard = state.lock();
    let AppData { store, reminders } = &mut *guard;

    let mut tasks = store.load_all();
    let mut armed = 0;
    let mut missed = 0;
    let mut changed = false;
    for task in &mut tasks {
        let is_missed = !task.completed
            && task.notification_id.is_some()
            && task.reminder_time.is_some_and(|at| at <= now);
        let handle = if is_missed {
            missed += 1;
            reminders.deliver_missed(task, now)
        } else {
            reminders.reschedule(task, now)
        };
        if handle.is_some() {
            armed += 1;
        }
        if handle != task.notification_id {
            task.notification_id = handle;
            changed = true;
        }
    }

    if changed {
        store.save_all(&tasks);
        publish(ctx, store);
    }
    log::info!(
        "commands: reminders reconciled armed={armed} missed={missed} total={}",
        tasks.len()
    );
    ok(armed)
}

/// Forgets the handles of reminders that were just shown, so a later launch does not
/// deliver them again. A handle that has since been replaced is left alone.
pub fn reminders_fired_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    fired: &[PendingReminder],
) -> CommandResult<usize> {
    let mut guard = state.lock();
    let store = &mut guard.store;

    let mut tasks = store.load_all();
    let mut cleared = 0;
    for task in &mut tasks {
        let shown = fired.iter().any(|reminder| {
            reminder.payload.task_id == task.id
                && task.notification_id.as_deref() == Some(reminder.handle.as_str())
        });
        if shown {
            task.notification_id = None;
            cleared += 1;
        }
    }

    if cleared > 0 {
        store.save_all(&tasks);
        publish(ctx, store);
    }
    ok(cleared)
}

#[cfg(all(feature = "app", not(test)))]
struct TauriCommandCtx<'a, R: Runtime> {
    app: &'a AppHandle<R>,
}

#[cfg(all(feature = "app", not(test)))]
impl<R: Runtime> CommandCtx for TauriCommandCtx<'_, R> {
    fn now(&self) -> Timestamp {
        Utc::now().timestamp_millis()
    }

    fn emit_state_updated(&self, payload: StatePayload) {
        let _ = self.app.emit(EVENT_STATE_UPDATED, payload);
    }
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn load_tasks(state: State<AppState>) -> CommandResult<Vec<Task>> {
    load_tasks_impl(state.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn list_tasks(
    app: AppHandle,
    state: State<AppState>,
    filters: TaskFilters,
    sort: SortMode,
) -> CommandResult<Vec<TaskListItem>> {
    let ctx = TauriCommandCtx { app: &app };
    list_tasks_impl(&ctx, state.inner(), filters, sort)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn get_task(state: State<AppState>, task_id: String) -> CommandResult<Option<Task>> {
    get_task_impl(state.inner(), task_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn task_stats(app: AppHandle, state: State<AppState>) -> CommandResult<TaskStats> {
    let ctx = TauriCommandCtx { app: &app };
    task_stats_impl(&ctx, state.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn save_task(
    app: AppHandle,
    state: State<AppState>,
    draft: TaskDraft,
) -> CommandResult<Option<Task>> {
    let ctx = TauriCommandCtx { app: &app };
    save_task_impl(&ctx, state.inner(), draft)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn update_task(
    app: AppHandle,
    state: State<AppState>,
    task_id: String,
    patch: TaskPatch,
) -> CommandResult<Option<Task>> {
    let ctx = TauriCommandCtx { app: &app };
    update_task_impl(&ctx, state.inner(), task_id, patch)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn toggle_task(
    app: AppHandle,
    state: State<AppState>,
    task_id: String,
) -> CommandResult<Option<Task>> {
    let ctx = TauriCommandCtx { app: &app };
    toggle_task_impl(&ctx, state.inner(), task_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn delete_task(app: AppHandle, state: State<AppState>, task_id: String) -> CommandResult<bool> {
    let ctx = TauriCommandCtx { app: &app };
    delete_task_impl(&ctx, state.inner(), task_id)
}

/// Startup hook; not exposed to the frontend.
#[cfg(all(feature = "app", not(test)))]
pub fn reconcile_reminders<R: Runtime>(app: &AppHandle<R>, state: &AppState) -> CommandResult<usize> {
    let ctx = TauriCommandCtx { app };
    reconcile_reminders_impl(&ctx, state)
}

/// Called by the dispatcher after it has shown `fired`.
#[cfg(all(feature = "app", not(test)))]
pub fn mark_reminders_fired<R: Runtime>(app: &AppHandle<R>, fired: &[PendingReminder]) {
    use tauri::Manager;

    let state = app.state::<AppState>();
    let ctx = TauriCommandCtx { app };
    reminders_fired_impl(&ctx, state.inner(), fired);
}
