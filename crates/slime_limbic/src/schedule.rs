//! Wake-time table for delayed one-shot tasks.
//!
//! Components never sleep or spawn; they push a task with the simulation
//! time at which it should fire and poll the table once per tick. Tasks due
//! in the same tick come out in wake-time order, ties broken by insertion
//! order, so replays are deterministic.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[derive(Debug, Clone)]
struct Entry<T> {
    at: f64,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.total_cmp(&other.at).then_with(|| self.seq.cmp(&other.seq))
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    queue: BinaryHeap<Reverse<Entry<T>>>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to fire once the clock reaches `at`.
    pub fn schedule(&mut self, at: f64, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Entry { at, seq, task }));
    }

    /// Pop the earliest task whose wake time is `<= now`.
    pub fn pop_due(&mut self, now: f64) -> Option<T> {
        if self.queue.peek()?.0.at > now {
            return None;
        }
        self.queue.pop().map(|Reverse(entry)| entry.task)
    }

    /// Drain every task due at `now`, earliest first.
    pub fn poll_due(&mut self, now: f64) -> Vec<T> {
        let mut due = Vec::new();
        while let Some(task) = self.pop_due(now) {
            due.push(task);
        }
        due
    }

    /// Drop every pending task matching `pred`.
    pub fn cancel<F: FnMut(&T) -> bool>(&mut self, mut pred: F) {
        self.queue.retain(|Reverse(entry)| !pred(&entry.task));
    }

    /// Wake time of the earliest pending task matching `pred`.
    pub fn next_wake<F: FnMut(&T) -> bool>(&self, mut pred: F) -> Option<f64> {
        self.queue
            .iter()
            .filter(|Reverse(entry)| pred(&entry.task))
            .map(|Reverse(entry)| entry.at)
            .min_by(f64::total_cmp)
    }

    pub fn is_pending<F: FnMut(&T) -> bool>(&self, pred: F) -> bool {
        self.next_wake(pred).is_some()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
