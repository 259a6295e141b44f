//! Virtual clock driving an effect.
//!
//! The scheduler owns one periodic tick and any number of one-shot spawn
//! timers. It never runs anything itself: the owner pulls due events in time
//! order with [`Scheduler::next_event`] and reacts to them, so ticks never
//! overlap and a cancelled timer can never fire.

use std::time::Duration;

/// Handle of a pending spawn timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy)]
struct SpawnTimer {
    id: TimerId,
    due: Duration,
}

/// A due event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Spawn(TimerId),
    Tick,
}

pub struct Scheduler {
    /// Current virtual time since start
    now: Duration,
    interval: Duration,
    /// Next tick deadline; `None` once cancelled
    next_tick: Option<Duration>,
    timers: Vec<SpawnTimer>,
    next_id: u64,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        Self {
            now: Duration::ZERO,
            interval,
            next_tick: Some(interval),
            timers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Arm a one-shot spawn timer `delay` from now
    pub fn schedule_spawn(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(SpawnTimer {
            id,
            due: self.now + delay,
        });
        id
    }

    pub fn pending_spawns(&self) -> usize {
        self.timers.len()
    }

    pub fn cancel_spawns(&mut self) {
        self.timers.clear();
    }

    /// Cancel the tick and every pending timer
    pub fn cancel_all(&mut self) {
        self.timers.clear();
        self.next_tick = None;
    }

    /// Push the next tick a full interval past `at`
    pub fn reanchor(&mut self, at: Duration) {
        if self.next_tick.is_some() {
            self.next_tick = Some(at + self.interval);
        }
    }

    /// Pop the earliest event due at or before `until`, moving the clock to
    /// it. Spawn timers fire before a tick due at the same instant.
    pub fn next_event(&mut self, until: Duration) -> Option<Event> {
        let timer = self
            .timers
            .iter()
            .enumerate()
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(idx, t)| (idx, t.due));

        match (timer, self.next_tick) {
            (Some((idx, due)), tick) if due <= until && tick.map_or(true, |t| due <= t) => {
                let fired = self.timers.swap_remove(idx);
                self.now = self.now.max(fired.due);
                Some(Event::Spawn(fired.id))
            }
            (_, Some(tick)) if tick <= until => {
                self.now = self.now.max(tick);
                self.next_tick = Some(tick + self.interval);
                Some(Event::Tick)
            }
            _ => {
                self.now = self.now.max(until);
                None
            }
        }
    }
}
