//! Study task list.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result, ValidationError};
use crate::storage::{keys, Store};

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Millisecond creation timestamp, as a string.
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub priority: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hydrate(store: &Store) -> Self {
        let mut tasks: Vec<Task> = store.load(keys::TASKS, Vec::new());
        for task in &mut tasks {
            task.priority = task.priority.clamp(MIN_PRIORITY, MAX_PRIORITY);
        }
        Self { tasks }
    }

    pub fn persist(&self, store: &Store) {
        store.save(keys::TASKS, &self.tasks);
    }

    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Append a task created at `now_ms`.
    ///
    /// Two tasks added in the same millisecond get consecutive ids.
    ///
    /// # Errors
    /// Returns a validation error if `text` is blank.
    pub fn add(&mut self, text: &str, now_ms: i64) -> Result<&Task> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::Empty { field: "text" }.into());
        }

        let mut stamp = now_ms;
        while self.get(&stamp.to_string()).is_some() {
            stamp += 1;
        }

        self.tasks.push(Task {
            id: stamp.to_string(),
            text: text.to_string(),
            completed: false,
            priority: MIN_PRIORITY,
        });
        tracing::debug!(id = stamp, "task added");
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    pub fn remove(&mut self, id: &str) -> Result<Task> {
        let index = self.index_of(id)?;
        Ok(self.tasks.remove(index))
    }

    pub fn toggle(&mut self, id: &str) -> Result<&Task> {
        let index = self.index_of(id)?;
        let task = &mut self.tasks[index];
        task.completed = !task.completed;
        Ok(task)
    }

    /// Set priority, clamped to `MIN_PRIORITY..=MAX_PRIORITY`.
    pub fn set_priority(&mut self, id: &str, priority: i64) -> Result<&Task> {
        let index = self.index_of(id)?;
        let task = &mut self.tasks[index];
        task.priority = priority.clamp(i64::from(MIN_PRIORITY), i64::from(MAX_PRIORITY)) as u8;
        Ok(task)
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::NotFound {
                kind: "task",
                id: id.to_string(),
            })
    }
}
