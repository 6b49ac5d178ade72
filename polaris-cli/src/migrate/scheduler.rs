//! Dependency-ordered task queue
//!
//! Tasks are held in enqueue order and released only once every kind they
//! depend on has drained from the queue. Because the dependency lists in
//! `EntityKind::dependencies` are transitively closed and acyclic, and
//! children are enqueued only after their parent task has fully joined,
//! some task is always ready while the queue is non-empty.

use std::collections::VecDeque;

use super::task::MigrationTask;

#[derive(Default)]
pub struct TaskScheduler {
    pending: VecDeque<MigrationTask>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, task: MigrationTask) {
        self.pending.push_back(task);
    }

    pub fn enqueue_all(&mut self, tasks: impl IntoIterator<Item = MigrationTask>) {
        self.pending.extend(tasks);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Remove and return the first task whose dependency kinds have no
    /// remaining representative in the queue.
    pub fn pop_ready(&mut self) -> Option<MigrationTask> {
        if self.pending.is_empty() {
            return None;
        }

        let ready = self.pending.iter().position(|task| {
            !self
                .pending
                .iter()
                .any(|other| task.depends_on().contains(&other.kind()))
        });

        // The graph is acyclic, so the only way to get here with no ready
        // task would be a bug in the dependency table.
        let index = ready.unwrap_or(0);
        debug_assert!(ready.is_some(), "no ready task in a non-empty queue");

        self.pending.remove(index)
    }
}
