//! Recent-task feed contract.

use std::{cell::RefCell, rc::Rc};

use shelf_contract::RecentTask;

/// Source of the live recent-task list.
pub trait TaskSource {
    /// Returns at most `limit` tasks, most recently used first, one representative activity per
    /// task.
    fn fetch_recent_tasks(&self, limit: usize) -> Vec<RecentTask>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Task source that never reports running tasks.
pub struct NoopTaskSource;

impl TaskSource for NoopTaskSource {
    fn fetch_recent_tasks(&self, _limit: usize) -> Vec<RecentTask> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Default)]
/// Task source backed by a replaceable in-memory list.
pub struct MemoryTaskSource {
    tasks: Rc<RefCell<Vec<RecentTask>>>,
}

impl MemoryTaskSource {
    /// Replaces the reported task list.
    pub fn set_tasks(&self, tasks: Vec<RecentTask>) {
        *self.tasks.borrow_mut() = tasks;
    }
}

impl TaskSource for MemoryTaskSource {
    fn fetch_recent_tasks(&self, limit: usize) -> Vec<RecentTask> {
        self.tasks.borrow().iter().take(limit).cloned().collect()
    }
}
