use std::cell::RefCell;
use std::rc::Rc;

use ticker_core::Tick;

/// A tick that remembers every `(time_stamp, delta_time)` it receives.
///
/// [`tick`](Self::tick) always returns the same handle, so registering it
/// twice exercises the ticker's duplicate check.
#[derive(Clone, Debug)]
pub struct TickRecorder {
    samples: Rc<RefCell<Vec<(f64, f64)>>>,
    tick: Tick,
}

impl TickRecorder {
    pub fn new() -> Self {
        let samples: Rc<RefCell<Vec<(f64, f64)>>> = Rc::new(RefCell::new(Vec::new()));
        let tick = {
            let samples = Rc::clone(&samples);
            Tick::new(move |time_stamp, delta_time| {
                samples.borrow_mut().push((time_stamp, delta_time));
            })
        };
        Self { samples, tick }
    }

    pub fn tick(&self) -> Tick {
        self.tick.clone()
    }

    pub fn samples(&self) -> Vec<(f64, f64)> {
        self.samples.borrow().clone()
    }

    pub fn time_stamps(&self) -> Vec<f64> {
        self.samples.borrow().iter().map(|(time, _)| *time).collect()
    }

    pub fn deltas(&self) -> Vec<f64> {
        self.samples.borrow().iter().map(|(_, delta)| *delta).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.samples.borrow_mut().clear();
    }
}

impl Default for TickRecorder {
    fn default() -> Self {
        Self::new()
    }
}
