use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use ticker_core::{Clock, IntervalCallback, IntervalId, IntervalScheduler};

use crate::ManualClock;

struct IntervalEntry {
    id: IntervalId,
    period_ms: f64,
    next_due_ms: f64,
    callback: IntervalCallback,
}

/// Interval source driven by a [`ManualClock`].
///
/// [`fire`](Self::fire) runs every live interval once without touching the
/// clock. [`run_until`](Self::run_until) walks the clock forward and fires
/// each period that comes due, setting the clock to the due time before every
/// firing.
pub struct ManualIntervalScheduler {
    clock: Rc<ManualClock>,
    entries: RefCell<Vec<IntervalEntry>>,
    next_id: Cell<IntervalId>,
}

impl ManualIntervalScheduler {
    pub fn new(clock: Rc<ManualClock>) -> Self {
        Self {
            clock,
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Fires every live interval once, in registration order.
    pub fn fire(&self) -> usize {
        let ids: Vec<IntervalId> = self.entries.borrow().iter().map(|entry| entry.id).collect();
        let mut fired = 0;
        for id in ids {
            // An earlier callback may have cancelled this interval.
            let callback = self.callback_for(id);
            if let Some(callback) = callback {
                callback();
                fired += 1;
            }
        }
        fired
    }

    /// Advances the clock to `target_ms`, firing every period that comes due
    /// on the way in due order. Returns the number of firings.
    pub fn run_until(&self, target_ms: f64) -> usize {
        let mut fired = 0;
        loop {
            let next = {
                let entries = self.entries.borrow();
                entries
                    .iter()
                    .filter(|entry| entry.next_due_ms <= target_ms)
                    .min_by(|a, b| {
                        a.next_due_ms
                            .total_cmp(&b.next_due_ms)
                            .then(a.id.cmp(&b.id))
                    })
                    .map(|entry| entry.id)
            };
            let Some(id) = next else { break };

            let (due_ms, callback) = {
                let mut entries = self.entries.borrow_mut();
                let Some(entry) = entries.iter_mut().find(|entry| entry.id == id) else {
                    break;
                };
                let due_ms = entry.next_due_ms;
                entry.next_due_ms += entry.period_ms;
                (due_ms, Rc::clone(&entry.callback))
            };
            if due_ms > self.clock.now_ms() {
                self.clock.set(due_ms);
            }
            callback();
            fired += 1;
        }
        if target_ms > self.clock.now_ms() {
            self.clock.set(target_ms);
        }
        fired
    }

    pub fn active_count(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn period_of(&self, id: IntervalId) -> Option<f64> {
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.period_ms)
    }

    fn callback_for(&self, id: IntervalId) -> Option<IntervalCallback> {
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| Rc::clone(&entry.callback))
    }
}

impl IntervalScheduler for ManualIntervalScheduler {
    fn schedule_interval(&self, callback: IntervalCallback, period_ms: f64) -> IntervalId {
        // A non-positive period would never leave `run_until`.
        let period_ms = if period_ms > 0.0 { period_ms } else { 1.0 };
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.entries.borrow_mut().push(IntervalEntry {
            id,
            period_ms,
            next_due_ms: self.clock.now_ms() + period_ms,
            callback,
        });
        id
    }

    fn cancel_interval(&self, id: IntervalId) {
        self.entries.borrow_mut().retain(|entry| entry.id != id);
    }
}

impl fmt::Debug for ManualIntervalScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualIntervalScheduler")
            .field("active", &self.active_count())
            .field("now_ms", &self.clock.now_ms())
            .finish()
    }
}
