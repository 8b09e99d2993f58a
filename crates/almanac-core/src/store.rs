use chrono::NaiveDate;
use tracing::debug;

use crate::datetime::{DateRange, format_iso};
use crate::error::{CalendarError, Result};
use crate::task::{Category, Task, TaskId};

/// In-memory task collection. Insertion order is kept for stable rendering.
#[derive(Debug, Default, Clone)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[tracing::instrument(skip(self, name), fields(start = %format_iso(start), end = %format_iso(end)))]
    pub fn create(
        &mut self,
        name: &str,
        category: Category,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<&Task> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CalendarError::validation("task name must not be empty"));
        }
        if start > end {
            return Err(CalendarError::validation(format!(
                "start {} is after end {}",
                format_iso(start),
                format_iso(end)
            )));
        }

        let task = Task::new(name.to_string(), category, DateRange { start, end });
        debug!(task_id = %task.id, name = %task.name, ?category, "created task");
        self.tasks.push(task);

        let idx = self.tasks.len() - 1;
        Ok(&self.tasks[idx])
    }

    /// Replaces a task's range in place. An inverted pair is re-ordered before
    /// it is stored.
    #[tracing::instrument(skip(self), fields(task_id = %task_id))]
    pub fn apply_range_edit(
        &mut self,
        task_id: TaskId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<&Task> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or(CalendarError::NotFound(task_id))?;

        let range = DateRange::new(start, end);
        task.start = range.start;
        task.end = range.end;
        debug!(
            start = %format_iso(task.start),
            end = %format_iso(task.end),
            "applied range edit"
        );
        Ok(task)
    }

    pub fn get(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks_on(&self, day: NaiveDate) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.covers(day))
    }
}
