use std::sync::atomic::{AtomicUsize, Ordering};

/// Completed-repository counter shared by all tasks of one run.
#[derive(Debug)]
pub struct ProgressCounter {
    completed: AtomicUsize,
    total: usize,
}

impl ProgressCounter {
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
        }
    }

    /// Records one completed repository and returns the new completed count.
    pub fn increment(&self) -> usize {
        let completed = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        debug_assert!(completed <= self.total, "more completions than repositories");
        completed
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.total
    }
}
