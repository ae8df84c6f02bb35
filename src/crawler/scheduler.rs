//! Scheduler for ordering the page fan-out
//!
//! This module handles:
//! - Priority queue management for planned page tasks
//! - Handing tasks to the fan-out in priority order

use crate::crawler::PageTask;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A page task queued for fetching with priority information
#[derive(Debug, Clone)]
struct QueuedTask(PageTask);

// Lower priority values have higher priority (are popped first from BinaryHeap)
impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .priority
            .cmp(&self.0.priority)
            .then_with(|| other.0.page_index.cmp(&self.0.page_index))
    }
}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.0.priority == other.0.priority && self.0.page_index == other.0.page_index
    }
}

impl Eq for QueuedTask {}

/// Frontier of planned page tasks
///
/// Tasks leave the frontier lowest priority value first, then in logical
/// page order.
#[derive(Debug, Default)]
pub struct Scheduler {
    frontier: BinaryHeap<QueuedTask>,
}

impl Scheduler {
    /// Creates a scheduler seeded with planned tasks
    pub fn new(tasks: Vec<PageTask>) -> Self {
        Self {
            frontier: tasks.into_iter().map(QueuedTask).collect(),
        }
    }

    /// Removes the next task to fetch
    pub fn next_task(&mut self) -> Option<PageTask> {
        self.frontier.pop().map(|queued| queued.0)
    }
}

impl Iterator for Scheduler {
    type Item = PageTask;

    fn next(&mut self) -> Option<PageTask> {
        self.next_task()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.frontier.len(), Some(self.frontier.len()))
    }
}
