//! Cooperative scheduling of engine steps and cycle transitions.
//!
//! Nothing here sleeps. Work is expressed as "run this task again no sooner
//! than `min_interval` from now", and the owner polls for due tasks on its own
//! frame cadence. Every entry is tagged with the generation that scheduled it;
//! entries from an older generation are dropped instead of run.

use std::{
    cell::Cell,
    rc::Rc,
    time::{Duration, Instant},
};

/// Source of the current time, as the duration since the clock was created.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall-clock time from [`Instant`].
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        MonotonicClock {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to. Clones share the same time, so a
/// test can keep one handle while the scheduler owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Rc<Cell<Duration>>);

impl ManualClock {
    pub fn new() -> Self {
        ManualClock::default()
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.0.get()
    }
}

/// Units of work the orchestrator schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// One backtracking step
    ClassicalStep,
    /// One inline wave-front step
    WaveStep,
    /// Move buffered worker results into the visible wave
    FlushWave,
    /// Generate the next maze after the dwell interval
    Regenerate,
    /// Start both engines on the new maze after the settle interval
    Restart,
}

/// A task taken off the schedule, with the generation that scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Due {
    pub task: Task,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    task: Task,
    generation: u64,
    due: Duration,
    seq: u64,
}

pub struct Schedule {
    clock: Box<dyn Clock>,
    /// Current generation. Bumped on every reset and every new maze.
    generation: u64,
    entries: Vec<Entry>,
    /// Tie-breaker so equally due tasks run in the order they were scheduled
    next_seq: u64,
}

impl Schedule {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Schedule {
            clock,
            generation: 0,
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Invalidate everything scheduled so far and return the new generation.
    pub fn advance_generation(&mut self) -> u64 {
        self.generation += 1;
        let dropped = self.entries.len();
        self.entries.clear();
        if dropped > 0 {
            tracing::debug!(
                generation = self.generation,
                dropped,
                "discarded scheduled tasks"
            );
        }
        self.generation
    }

    /// Schedule `task` to run no sooner than `min_interval` from now, tagged
    /// with the current generation. An already pending entry for the same
    /// task is replaced.
    pub fn schedule_next(&mut self, task: Task, min_interval: Duration) {
        self.cancel(task);
        let entry = Entry {
            task,
            generation: self.generation,
            due: self.now() + min_interval,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.entries.push(entry);
    }

    pub fn cancel(&mut self, task: Task) {
        self.entries.retain(|e| e.task != task);
    }

    #[cfg(test)]
    pub fn is_scheduled(&self, task: Task) -> bool {
        self.entries.iter().any(|e| e.task == task)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time until the earliest pending task is due, zero if one already is.
    pub fn time_until_next(&self) -> Option<Duration> {
        let now = self.now();
        self.entries
            .iter()
            .map(|e| e.due.saturating_sub(now))
            .min()
    }

    /// Remove every task that is due now and return them in due order.
    ///
    /// Tasks scheduled while the returned batch is being run land in a later
    /// batch, so a task rescheduling itself with a zero interval runs once
    /// per call rather than looping.
    pub fn take_due(&mut self) -> Vec<Due> {
        let now = self.now();
        let generation = self.generation;
        self.entries.retain(|e| {
            if e.generation != generation {
                tracing::debug!(task = ?e.task, stale = e.generation, "dropping stale task");
            }
            e.generation == generation
        });
        let (mut due, pending): (Vec<Entry>, Vec<Entry>) =
            self.entries.drain(..).partition(|e| e.due <= now);
        self.entries = pending;
        due.sort_by_key(|e| (e.due, e.seq));
        due.into_iter()
            .map(|e| Due {
                task: e.task,
                generation: e.generation,
            })
            .collect()
    }

    /// Whether a task taken from [`Schedule::take_due`] still belongs to the
    /// current generation. A task run earlier in the same batch may have
    /// started a new one.
    pub fn is_current(&self, due: &Due) -> bool {
        due.generation == self.generation
    }
}
