//! Delayed delivery of messages to the single-threaded event loop.
//!
//! Nothing here runs on its own. The event loop asks for the next due
//! instant, waits for terminal input at most that long, then drains whatever
//! became due. Messages due at the same instant come out in the order they
//! were scheduled.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Entry<M> {
    due: Instant,
    seq: u64,
    msg: M,
}

impl<M> PartialEq for Entry<M> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<M> Eq for Entry<M> {}

impl<M> PartialOrd for Entry<M> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<M> Ord for Entry<M> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

#[derive(Debug)]
pub struct Scheduler<M> {
    queue: BinaryHeap<Reverse<Entry<M>>>,
    seq: u64,
}

impl<M> Default for Scheduler<M> {
    fn default() -> Self {
        Scheduler {
            queue: BinaryHeap::new(),
            seq: 0,
        }
    }
}

impl<M> Scheduler<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `msg` for delivery `after` from `now`.
    pub fn schedule(&mut self, now: Instant, after: Duration, msg: M) {
        self.seq += 1;
        self.queue.push(Reverse(Entry {
            due: now + after,
            seq: self.seq,
            msg,
        }));
    }

    /// When the earliest pending message becomes due.
    pub fn next_due(&self) -> Option<Instant> {
        self.queue.peek().map(|Reverse(e)| e.due)
    }

    /// How long the event loop may block before something becomes due.
    pub fn timeout(&self, now: Instant, idle: Duration) -> Duration {
        self.next_due()
            .map(|due| due.saturating_duration_since(now))
            .unwrap_or(idle)
    }

    /// Removes and returns the earliest message due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<M> {
        match self.queue.peek() {
            Some(Reverse(e)) if e.due <= now => self.queue.pop().map(|Reverse(e)| e.msg),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
