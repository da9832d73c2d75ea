//! The canonical task collection.
//!
//! Every mutator loads the whole collection, changes it and writes the whole collection
//! back under one key. Persistence failures never reach the caller: a failed read is an
//! empty list and a failed write is dropped, both logged.

use crate::models::{Status, Task, TaskPatch, Timestamp};
use crate::storage::{KeyValueStore, StorageError};

pub const DEFAULT_STORAGE_KEY: &str = "@todos";

pub struct TaskStore<S> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> TaskStore<S> {
    pub fn new(backend: S) -> Self {
        Self::with_key(backend, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn try_load_all(&self) -> Result<Vec<Task>, StorageError> {
        match self.backend.get(&self.key)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn try_save_all(&mut self, tasks: &[Task]) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(tasks)?;
        self.backend.set(&self.key, &bytes)
    }

    pub fn load_all(&self) -> Vec<Task> {
        self.try_load_all().unwrap_or_else(|err| {
            log::error!("store: load failed key={} err={err}", self.key);
            Vec::new()
        })
    }

    pub fn save_all(&mut self, tasks: &[Task]) {
        if let Err(err) = self.try_save_all(tasks) {
            log::error!(
                "store: save failed key={} count={} err={err}",
                self.key,
                tasks.len()
            );
        }
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        self.load_all().into_iter().find(|task| task.id == id)
    }

    pub fn add(&mut self, task: Task) {
        let mut tasks = self.load_all();
        log::debug!("store: add id={}", task.id);
        tasks.push(task);
        self.save_all(&tasks);
    }

    /// `now` becomes the record's `updatedAt`, floored at its `createdAt`.
    pub fn update(&mut self, id: &str, patch: TaskPatch, now: Timestamp) {
        let mut tasks = self.load_all();
        let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
            log::debug!("store: update skipped, id={id} not found");
            return;
        };
        patch.apply_to(task);
        touch(task, now);
        self.save_all(&tasks);
    }

    pub fn delete(&mut self, id: &str) {
        let mut tasks = self.load_all();
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        if tasks.len() == before {
            log::debug!("store: delete skipped, id={id} not found");
            return;
        }
        self.save_all(&tasks);
    }

    pub fn toggle_completion(&mut self, id: &str, now: Timestamp) {
        let mut tasks = self.load_all();
        let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
            log::debug!("store: toggle skipped, id={id} not found");
            return;
        };
        task.completed = !task.completed;
        task.status = if task.completed {
            Status::Completed
        } else {
            Status::Pending
        };
        touch(task, now);
        self.save_all(&tasks);
    }
}

fn touch(task: &mut Task, now: Timestamp) {
    task.updated_at = now.max(task.created_at);
}
