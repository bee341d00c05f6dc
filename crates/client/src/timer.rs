use std::time::{Duration, Instant};

/// Identifies a scheduled task so it can be cancelled before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct Scheduled<T> {
    handle: TaskHandle,
    deadline: Instant,
    task: T,
}

/// One-shot timers polled from the event loop.
///
/// Time is always passed in, so the owner decides what "now" means. A task is
/// returned from [`Scheduler::take_due`] exactly once, and never before its deadline.
#[derive(Debug)]
pub struct Scheduler<T> {
    tasks: Vec<Scheduled<T>>,
    next_handle: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_handle: 0,
        }
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);

        self.tasks.push(Scheduled {
            handle,
            deadline: now + delay,
            task,
        });

        handle
    }

    /// Returns false if the task already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|s| s.handle != handle);
        self.tasks.len() != before
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|s| s.handle == handle)
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.iter().map(|s| s.deadline).min()
    }

    /// Removes and returns every task whose deadline has passed, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<(TaskHandle, T)> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.tasks.len() {
            if self.tasks[i].deadline <= now {
                due.push(self.tasks.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|s| s.deadline);
        due.into_iter().map(|s| (s.handle, s.task)).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
