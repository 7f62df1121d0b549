//! Deadline-ordered task queue that replaces engine coroutines.
//!
//! Deadlines are in scaled simulation seconds, so a paused game (time
//! scale 0) never reaches any pending deadline. Tasks with equal
//! deadlines run in the order they were scheduled.

use std::collections::{BTreeMap, HashMap};

use hecs::Entity;

/// Handle to a pending task, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// Deferred work resumed by the engine when its deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Auto-advance or first-wave delay elapsed.
    StartNextWave,
    /// Next enemy of the running wave is due.
    SpawnEnemy,
    /// Recount live enemies of the running wave.
    PollWaveCompletion,
    /// Death animation finished.
    DespawnEnemy(Entity),
    /// Projectile lifetime elapsed.
    ExpireProjectile(Entity),
    /// Tower target rescan.
    ScanTargets(Entity),
    /// Beam damage sample.
    BeamDamage(Entity),
}

#[derive(Debug, Default)]
pub struct Scheduler {
    pending: BTreeMap<(u64, u64), Task>,
    /// Sequence number -> deadline key, for cancellation.
    deadlines: HashMap<u64, u64>,
    next_seq: u64,
}

/// Non-negative f64 bit patterns sort in numeric order.
fn deadline_key(secs: f64) -> u64 {
    secs.max(0.0).to_bits()
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to run once `delay_secs` of sim time have passed after `now`.
    pub fn schedule(&mut self, now: f64, delay_secs: f64, task: Task) -> TaskId {
        self.schedule_at(now + delay_secs.max(0.0), task)
    }

    /// Schedule `task` at an absolute sim time.
    pub fn schedule_at(&mut self, deadline: f64, task: Task) -> TaskId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let key = deadline_key(deadline);
        self.pending.insert((key, seq), task);
        self.deadlines.insert(seq, key);
        TaskId(seq)
    }

    /// Remove a pending task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        match self.deadlines.remove(&id.0) {
            Some(key) => self.pending.remove(&(key, id.0)).is_some(),
            None => false,
        }
    }

    /// Pop the earliest task whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: f64) -> Option<Task> {
        let (&(key, seq), _) = self.pending.first_key_value()?;
        if key > deadline_key(now) {
            return None;
        }
        self.deadlines.remove(&seq);
        self.pending.remove(&(key, seq))
    }

    /// Deadline of the earliest pending task.
    pub fn next_deadline(&self) -> Option<f64> {
        self.pending.first_key_value().map(|(&(key, _), _)| f64::from_bits(key))
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.deadlines.contains_key(&id.0)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.deadlines.clear();
    }
}
