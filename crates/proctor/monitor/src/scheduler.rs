//! Cancellable-task scheduler on a millisecond virtual clock.
//!
//! The monitor never sleeps. Timers are queued here with a due time, and
//! whoever drives the monitor (the async runtime, a replay, a test) advances
//! the clock and hands due tasks back to it.

use std::collections::{BTreeMap, HashMap};

use proctor_types::GraceChannel;

/// Handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Work a timer performs when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    /// One-second countdown step of a grace period.
    GraceTick(GraceChannel),
    /// Periodic evidence capture.
    PhotoCapture,
}

/// A task that has come due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTask {
    pub handle: TimerHandle,
    pub task: TimerTask,
    pub due_ms: u64,
}

/// Scheduler interface the monitor depends on.
pub trait Scheduler: Send {
    /// Current clock reading.
    fn now_ms(&self) -> u64;

    /// Move the clock forward. Never moves backwards.
    fn advance_to(&mut self, now_ms: u64);

    /// Run `task` after `delay_ms`.
    fn schedule(&mut self, delay_ms: u64, task: TimerTask) -> TimerHandle;

    /// Cancel a pending task. Returns false if it already fired or was cancelled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;

    /// Cancel everything; returns the number of tasks dropped.
    fn cancel_all(&mut self) -> usize;

    /// Due time of the earliest pending task.
    fn next_deadline(&self) -> Option<u64>;

    /// Pop the earliest task due at or before `now_ms`, advancing the clock to its due time.
    fn pop_due(&mut self, now_ms: u64) -> Option<DueTask>;

    /// Number of pending tasks.
    fn pending(&self) -> usize;
}

/// Deterministic timer queue ordered by (due time, insertion order).
#[derive(Debug, Default)]
pub struct TimerQueue {
    now_ms: u64,
    next_id: u64,
    queue: BTreeMap<(u64, u64), TimerTask>,
    due_by_handle: HashMap<TimerHandle, u64>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a handle is still pending.
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.due_by_handle.contains_key(&handle)
    }
}

impl Scheduler for TimerQueue {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn advance_to(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    fn schedule(&mut self, delay_ms: u64, task: TimerTask) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let due = self.now_ms.saturating_add(delay_ms);
        self.queue.insert((due, handle.0), task);
        self.due_by_handle.insert(handle, due);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.due_by_handle.remove(&handle) {
            Some(due) => self.queue.remove(&(due, handle.0)).is_some(),
            None => false,
        }
    }

    fn cancel_all(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        self.due_by_handle.clear();
        dropped
    }

    fn next_deadline(&self) -> Option<u64> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    fn pop_due(&mut self, now_ms: u64) -> Option<DueTask> {
        let (&(due, id), _) = self.queue.iter().next()?;
        if due > now_ms {
            return None;
        }
        let task = self.queue.remove(&(due, id))?;
        let handle = TimerHandle(id);
        self.due_by_handle.remove(&handle);
        self.advance_to(due);
        Some(DueTask {
            handle,
            task,
            due_ms: due,
        })
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}
