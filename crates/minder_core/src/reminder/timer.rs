//! Bounded deferred-execution queue.
//!
//! Mirrors the contract of a host timer facility: a single wait can never be
//! longer than `max_delay`. Entries are ordered by due instant, FIFO among
//! equal instants.

use crate::error::AppError;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use time::{Duration, OffsetDateTime};

/// What a queued wake-up does when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HopKind {
    /// Re-arm from the live task state (chained hop).
    Rearm,
    /// Deliver the reminder computed for `target`.
    Deliver { target: OffsetDateTime },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub task_id: String,
    pub generation: u64,
    pub kind: HopKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HopHandle(u64);

#[derive(Debug, Clone)]
pub struct QueuedHop {
    pub handle: HopHandle,
    pub due: OffsetDateTime,
    pub hop: Hop,
}

impl PartialEq for QueuedHop {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for QueuedHop {}

impl Ord for QueuedHop {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.handle.0.cmp(&other.handle.0))
    }
}

impl PartialOrd for QueuedHop {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug)]
pub struct TimerQueue {
    max_delay: Duration,
    next_handle: u64,
    heap: BinaryHeap<Reverse<QueuedHop>>,
}

impl TimerQueue {
    pub fn new(max_delay: Duration) -> Self {
        Self {
            max_delay,
            next_handle: 0,
            heap: BinaryHeap::new(),
        }
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Queues `hop` to fire `delay` after `now`.
    pub fn after(
        &mut self,
        now: OffsetDateTime,
        delay: Duration,
        hop: Hop,
    ) -> Result<HopHandle, AppError> {
        if delay.is_negative() {
            return Err(AppError::invalid_input("delay must not be negative"));
        }
        if delay > self.max_delay {
            return Err(AppError::invalid_input(format!(
                "delay of {}ms exceeds the {}ms timer limit",
                delay.whole_milliseconds(),
                self.max_delay.whole_milliseconds()
            )));
        }
        let due = now
            .checked_add(delay)
            .ok_or_else(|| AppError::invalid_input("due instant is out of range"))?;

        let handle = HopHandle(self.next_handle);
        self.next_handle += 1;
        self.heap.push(Reverse(QueuedHop { handle, due, hop }));
        Ok(handle)
    }

    pub fn next_due(&self) -> Option<OffsetDateTime> {
        self.heap.peek().map(|Reverse(entry)| entry.due)
    }

    /// Removes and returns the earliest hop if it is due at `now`.
    pub fn pop_due(&mut self, now: OffsetDateTime) -> Option<QueuedHop> {
        match self.heap.peek() {
            Some(Reverse(entry)) if entry.due <= now => self.heap.pop().map(|Reverse(entry)| entry),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Queued hops in firing order.
    pub fn pending(&self) -> Vec<QueuedHop> {
        let mut entries: Vec<QueuedHop> =
            self.heap.iter().map(|Reverse(entry)| entry.clone()).collect();
        entries.sort();
        entries
    }
}
