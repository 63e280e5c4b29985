//! Task Store abstraction read by the reminder scheduler at every hop.

use crate::error::AppError;
use crate::model::Task;
use crate::storage::json_store;
use std::path::{Path, PathBuf};

pub trait TaskStore {
    /// Returns the latest committed version of a task, or `None` once deleted.
    fn get(&self, id: &str) -> Result<Option<Task>, AppError>;

    fn list(&self) -> Result<Vec<Task>, AppError>;

    fn insert(&mut self, task: Task) -> Result<(), AppError>;

    /// Replaces the stored task with the same id.
    fn update(&mut self, task: Task) -> Result<(), AppError>;

    fn remove(&mut self, id: &str) -> Result<Option<Task>, AppError>;
}

/// JSON file backed store. Every call goes back to disk, so a hop always
/// observes edits made by other `minder` processes.
#[derive(Debug, Clone)]
pub struct JsonTaskStore {
    path: PathBuf,
}

impl JsonTaskStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self::new(json_store::store_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TaskStore for JsonTaskStore {
    fn get(&self, id: &str) -> Result<Option<Task>, AppError> {
        let tasks = json_store::load_tasks(&self.path)?;
        Ok(tasks.into_iter().find(|task| task.id == id))
    }

    fn list(&self) -> Result<Vec<Task>, AppError> {
        json_store::load_tasks(&self.path)
    }

    fn insert(&mut self, task: Task) -> Result<(), AppError> {
        let mut tasks = json_store::load_tasks(&self.path)?;
        if tasks.iter().any(|existing| existing.id == task.id) {
            return Err(AppError::invalid_input("task id already exists"));
        }
        tasks.push(task);
        json_store::save_tasks(&self.path, &tasks)
    }

    fn update(&mut self, task: Task) -> Result<(), AppError> {
        let mut tasks = json_store::load_tasks(&self.path)?;
        let slot = tasks
            .iter_mut()
            .find(|existing| existing.id == task.id)
            .ok_or_else(|| AppError::invalid_input("task not found"))?;
        *slot = task;
        json_store::save_tasks(&self.path, &tasks)
    }

    fn remove(&mut self, id: &str) -> Result<Option<Task>, AppError> {
        let mut tasks = json_store::load_tasks(&self.path)?;
        let Some(index) = tasks.iter().position(|task| task.id == id) else {
            return Ok(None);
        };
        let removed = tasks.remove(index);
        json_store::save_tasks(&self.path, &tasks)?;
        Ok(Some(removed))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTaskStore {
    tasks: Vec<Task>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }
}

impl TaskStore for MemoryTaskStore {
    fn get(&self, id: &str) -> Result<Option<Task>, AppError> {
        Ok(self.tasks.iter().find(|task| task.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<Task>, AppError> {
        Ok(self.tasks.clone())
    }

    fn insert(&mut self, task: Task) -> Result<(), AppError> {
        if self.tasks.iter().any(|existing| existing.id == task.id) {
            return Err(AppError::invalid_input("task id already exists"));
        }
        self.tasks.push(task);
        Ok(())
    }

    fn update(&mut self, task: Task) -> Result<(), AppError> {
        let slot = self
            .tasks
            .iter_mut()
            .find(|existing| existing.id == task.id)
            .ok_or_else(|| AppError::invalid_input("task not found"))?;
        *slot = task;
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<Option<Task>, AppError> {
        let index = self.tasks.iter().position(|task| task.id == id);
        Ok(index.map(|index| self.tasks.remove(index)))
    }
}
