//! Single-threaded cooperative task queue.
//!
//! The frame tick and the drug-spawn cadence are both periodic tasks on one
//! queue, popped in due-time order, so their mutations of shared engine state
//! can never interleave.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// What a popped task asks the driver to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Step every engine once.
    Frame,
    /// Fire the drug engine's spawn task.
    SpawnMolecule,
    /// Add the drug (one-shot).
    ActivateDrug,
}

/// A task that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTask {
    pub kind: TaskKind,
    pub due_us: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    due_us: u64,
    /// Scheduling order, breaks ties between tasks due at the same instant.
    seq: u64,
    kind: TaskKind,
    interval_us: Option<u64>,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due_us, self.seq).cmp(&(other.due_us, other.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Converts seconds to whole microseconds.
pub fn seconds_to_us(seconds: f64) -> u64 {
    (seconds * 1_000_000.0).round().max(0.0) as u64
}

#[derive(Debug, Default)]
pub struct TickScheduler {
    queue: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
    now_us: u64,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time of the most recently popped task.
    pub fn now_us(&self) -> u64 {
        self.now_us
    }

    pub fn now_s(&self) -> f64 {
        self.now_us as f64 / 1_000_000.0
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Schedules `kind` to run at `first_due_us` and then every `interval_us`.
    /// A zero interval is treated as one microsecond.
    pub fn schedule_periodic(&mut self, kind: TaskKind, first_due_us: u64, interval_us: u64) {
        self.push(kind, first_due_us, Some(interval_us.max(1)));
    }

    pub fn schedule_once(&mut self, kind: TaskKind, due_us: u64) {
        self.push(kind, due_us, None);
    }

    /// Removes every pending task of `kind`. Returns how many were removed.
    pub fn cancel(&mut self, kind: TaskKind) -> usize {
        let before = self.queue.len();
        self.queue.retain(|Reverse(entry)| entry.kind != kind);
        before - self.queue.len()
    }

    /// Pops the earliest task due at or before `limit_us`, rescheduling it if
    /// periodic. Returns `None` once nothing is due within the limit.
    pub fn pop_due(&mut self, limit_us: u64) -> Option<DueTask> {
        let due = self.queue.peek().map(|Reverse(entry)| entry.due_us)?;
        if due > limit_us {
            return None;
        }
        let Reverse(entry) = self.queue.pop()?;
        self.now_us = entry.due_us;
        if let Some(interval) = entry.interval_us {
            self.push(entry.kind, entry.due_us.saturating_add(interval), Some(interval));
        }
        Some(DueTask { kind: entry.kind, due_us: entry.due_us })
    }

    fn push(&mut self, kind: TaskKind, due_us: u64, interval_us: Option<u64>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Entry { due_us, seq, kind, interval_us }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_due_order_and_reschedules() {
        let mut scheduler = TickScheduler::new();
        scheduler.schedule_periodic(TaskKind::Frame, 16_000, 16_000);
        scheduler.schedule_periodic(TaskKind::SpawnMolecule, 100_000, 100_000);

        let mut frames = 0;
        let mut spawns = 0;
        let mut last = 0;
        while let Some(task) = scheduler.pop_due(1_000_000) {
            assert!(task.due_us >= last);
            last = task.due_us;
            match task.kind {
                TaskKind::Frame => frames += 1,
                TaskKind::SpawnMolecule => spawns += 1,
                TaskKind::ActivateDrug => unreachable!(),
            }
        }
        assert_eq!(frames, 62);
        assert_eq!(spawns, 10);
        assert_eq!(scheduler.len(), 2);
    }

    #[test]
    fn ties_run_in_scheduling_order() {
        let mut scheduler = TickScheduler::new();
        scheduler.schedule_once(TaskKind::ActivateDrug, 50);
        scheduler.schedule_once(TaskKind::Frame, 50);
        assert_eq!(scheduler.pop_due(50).map(|t| t.kind), Some(TaskKind::ActivateDrug));
        assert_eq!(scheduler.pop_due(50).map(|t| t.kind), Some(TaskKind::Frame));
        assert!(scheduler.pop_due(50).is_none());
    }

    #[test]
    fn cancel_drops_pending_tasks() {
        let mut scheduler = TickScheduler::new();
        scheduler.schedule_periodic(TaskKind::SpawnMolecule, 10, 10);
        scheduler.schedule_periodic(TaskKind::Frame, 10, 10);
        assert_eq!(scheduler.cancel(TaskKind::SpawnMolecule), 1);
        assert_eq!(scheduler.pop_due(10).map(|t| t.kind), Some(TaskKind::Frame));
    }

    #[test]
    fn seconds_round_to_microseconds() {
        assert_eq!(seconds_to_us(0.016), 16_000);
        assert_eq!(seconds_to_us(0.1), 100_000);
    }
}
