//! Session timer queue
//!
//! Timers are plain entries in a min-heap keyed on their due time. Each
//! entry carries the session generation it was scheduled in, so entries
//! left over from an earlier session can be recognised and dropped.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::debug;

/// Period of the sleep alert tone
pub const CONTINUOUS_ALERT_PERIOD_MS: u64 = 800;

/// Time the driver must stay awake before the episode count resets
pub const RECOVERY_WINDOW_MS: u64 = 30_000;

/// Timer kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// Repeating sleep alert tone
    ContinuousAlert,
    /// One-shot episode reset after staying awake
    Recovery,
}

impl TimerKind {
    /// Delay from scheduling to first firing
    pub fn delay_ms(self) -> u64 {
        match self {
            TimerKind::ContinuousAlert => CONTINUOUS_ALERT_PERIOD_MS,
            TimerKind::Recovery => RECOVERY_WINDOW_MS,
        }
    }

    /// Repeat period, if the timer repeats
    pub fn period_ms(self) -> Option<u64> {
        match self {
            TimerKind::ContinuousAlert => Some(CONTINUOUS_ALERT_PERIOD_MS),
            TimerKind::Recovery => None,
        }
    }
}

/// A scheduled timer
#[derive(Debug, Clone, Copy)]
pub struct ScheduledTimer {
    pub kind: TimerKind,
    /// Engine time the timer is due (milliseconds)
    pub due_ms: u64,
    /// Session generation at scheduling time
    pub generation: u64,
    seq: u64,
}

impl ScheduledTimer {
    /// Next due time of a repeating timer fired at `now_ms`.
    ///
    /// Missed periods are skipped rather than fired in a burst.
    pub fn next_due(&self, now_ms: u64) -> Option<u64> {
        let period = self.kind.period_ms()?;
        let late = now_ms.saturating_sub(self.due_ms) % period;
        Some(now_ms.max(self.due_ms) + period - late)
    }
}

impl Eq for ScheduledTimer {}

impl PartialEq for ScheduledTimer {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}

impl Ord for ScheduledTimer {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior (earliest time first)
        // Then by scheduling order
        other
            .due_ms
            .cmp(&self.due_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for ScheduledTimer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of pending timers
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    queue: BinaryHeap<ScheduledTimer>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a timer of `kind` due at `due_ms`
    pub fn schedule(&mut self, kind: TimerKind, due_ms: u64, generation: u64) {
        debug!("Scheduling {:?} at {}ms (generation {})", kind, due_ms, generation);
        self.queue.push(ScheduledTimer {
            kind,
            due_ms,
            generation,
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }

    /// Cancel all pending timers of `kind`, returning how many were removed
    pub fn cancel(&mut self, kind: TimerKind) -> usize {
        let before = self.queue.len();
        self.queue.retain(|timer| timer.kind != kind);
        let removed = before - self.queue.len();
        if removed > 0 {
            debug!("Cancelled {} {:?} timer(s)", removed, kind);
        }
        removed
    }

    pub fn is_scheduled(&self, kind: TimerKind) -> bool {
        self.queue.iter().any(|timer| timer.kind == kind)
    }

    /// Earliest pending due time
    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.peek().map(|timer| timer.due_ms)
    }

    /// Pop the earliest timer if it is due at `now_ms`
    pub fn pop_due(&mut self, now_ms: u64) -> Option<ScheduledTimer> {
        if self.queue.peek()?.due_ms <= now_ms {
            self.queue.pop()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
