//! In-memory task and result registry

use crate::error::PipelineError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use remedy_model::{Task, TaskId, TaskResult, TaskStatus};
use remedy_safety::ContentHash;

/// Tasks by id plus their single recorded result
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: DashMap<TaskId, Task>,
    results: DashMap<TaskId, TaskResult>,
    snapshots: DashMap<TaskId, ContentHash>,
}

impl TaskStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new task
    ///
    /// # Errors
    /// [`PipelineError::DuplicateTask`] when the id is taken.
    pub fn insert(&self, task: Task) -> Result<(), PipelineError> {
        self.insert_with_snapshot(task, None)
    }

    /// Add a new task with the hash its file had when it was accepted
    ///
    /// # Errors
    /// [`PipelineError::DuplicateTask`] when the id is taken.
    pub fn insert_with_snapshot(
        &self,
        task: Task,
        snapshot: Option<ContentHash>,
    ) -> Result<(), PipelineError> {
        match self.tasks.entry(task.id.clone()) {
            Entry::Occupied(_) => Err(PipelineError::DuplicateTask(task.id)),
            Entry::Vacant(slot) => {
                // Visible before the task itself
                if let Some(hash) = snapshot {
                    self.snapshots.insert(task.id.clone(), hash);
                }
                slot.insert(task);
                Ok(())
            }
        }
    }

    /// Content hash recorded at submission, if the file existed then
    #[must_use]
    pub fn snapshot(&self, id: &TaskId) -> Option<ContentHash> {
        self.snapshots.get(id).map(|h| *h)
    }

    /// Snapshot of a task
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks.get(id).map(|t| t.clone())
    }

    /// Mutate a task in place
    ///
    /// # Errors
    /// [`PipelineError::UnknownTask`], or whatever `f` returns.
    pub fn update<T>(
        &self,
        id: &TaskId,
        f: impl FnOnce(&mut Task) -> Result<T, PipelineError>,
    ) -> Result<T, PipelineError> {
        let mut task = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| PipelineError::UnknownTask(id.clone()))?;
        f(&mut task)
    }

    /// Record the result for a task; succeeds once per id
    ///
    /// # Errors
    /// [`PipelineError::ResultAlreadyRecorded`] on a second call.
    pub fn record_result(&self, result: TaskResult) -> Result<(), PipelineError> {
        match self.results.entry(result.task_id.clone()) {
            Entry::Occupied(_) => Err(PipelineError::ResultAlreadyRecorded(result.task_id)),
            Entry::Vacant(slot) => {
                slot.insert(result);
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn result(&self, id: &TaskId) -> Option<TaskResult> {
        self.results.get(id).map(|r| r.clone())
    }

    /// Every recorded result, in no particular order
    #[must_use]
    pub fn results(&self) -> Vec<TaskResult> {
        self.results.iter().map(|r| r.value().clone()).collect()
    }

    /// Number of tasks with the given status
    #[must_use]
    pub fn count_with_status(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
