//! Logical-clock timer wheel backing all of the engine's temporal behavior.
//!
//! Timers carry a payload instead of a callback so firing is a plain value
//! handed back to the caller; the engine re-validates current state when it
//! receives one rather than trusting anything captured at schedule time.
//! The clock only moves when the host calls [`Scheduler::advance_to`] — a
//! requestAnimationFrame loop feeding `performance.now()` in the browser,
//! hand-written timestamps in tests.

/// Opaque handle to a scheduled timer. Stale handles are harmless: canceling
/// an already-fired timer is a no-op and `remaining` reports 0 for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerHandle(u64);

struct Entry<T> {
    id: u64,
    deadline: f64,
    period: Option<f64>,
    payload: T,
}

pub struct Scheduler<T> {
    now: f64,
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T: Clone> Scheduler<T> {
    pub fn new(now: f64) -> Self {
        Self {
            now,
            next_id: 1,
            entries: Vec::new(),
        }
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    /// Fire `payload` once, `ms` from the current logical time.
    pub fn after(&mut self, ms: f64, payload: T) -> TimerHandle {
        self.insert(ms, None, payload)
    }

    /// Fire `payload` every `ms`, first firing `ms` from now.
    pub fn every(&mut self, ms: f64, payload: T) -> TimerHandle {
        self.insert(ms, Some(ms), payload)
    }

    /// Repeating timer whose first interval differs from the steady period.
    /// Used to resume a repeat cycle with a partial remaining interval.
    pub fn repeating_after(&mut self, initial_ms: f64, period_ms: f64, payload: T) -> TimerHandle {
        self.insert(initial_ms, Some(period_ms), payload)
    }

    fn insert(&mut self, delay_ms: f64, period: Option<f64>, payload: T) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            deadline: self.now + delay_ms.max(0.0),
            period,
            payload,
        });
        TimerHandle(id)
    }

    /// Cancel a timer. Safe to call with a handle that already fired or was
    /// canceled before.
    pub fn cancel(&mut self, handle: TimerHandle) {
        self.entries.retain(|e| e.id != handle.0);
    }

    /// Milliseconds until the timer next fires; 0 for fired/canceled handles.
    pub fn remaining(&self, handle: TimerHandle) -> f64 {
        self.entries
            .iter()
            .find(|e| e.id == handle.0)
            .map(|e| (e.deadline - self.now).max(0.0))
            .unwrap_or(0.0)
    }

    /// Move the clock to `now` and return every payload whose deadline was
    /// reached, ordered by deadline (schedule order breaking ties). Repeating
    /// timers re-arm themselves; a period can fire several times in one call
    /// if the host was away longer than the period.
    pub fn advance_to(&mut self, now: f64) -> Vec<T> {
        if now > self.now {
            self.now = now;
        }
        let mut fired = Vec::new();
        loop {
            let due = self
                .entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.deadline <= self.now)
                .min_by(|(_, a), (_, b)| {
                    a.deadline
                        .partial_cmp(&b.deadline)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(a.id.cmp(&b.id))
                })
                .map(|(i, _)| i);
            let Some(idx) = due else { break };
            if let Some(period) = self.entries[idx].period {
                fired.push(self.entries[idx].payload.clone());
                self.entries[idx].deadline += period.max(1.0);
            } else {
                let entry = self.entries.swap_remove(idx);
                fired.push(entry.payload);
            }
        }
        fired
    }

    /// Drop every pending timer without firing it.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }
}
