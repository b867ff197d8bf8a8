use std::rc::Rc;

use ticker_core::{Clock, TimingSources};

use crate::{ManualClock, ManualFrameScheduler, ManualIntervalScheduler};

/// Manual clock, frame source and interval source wired together.
#[derive(Clone, Debug)]
pub struct ManualTimingSources {
    clock: Rc<ManualClock>,
    frames: Rc<ManualFrameScheduler>,
    intervals: Rc<ManualIntervalScheduler>,
}

impl ManualTimingSources {
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    pub fn starting_at(start_ms: f64) -> Self {
        let clock = Rc::new(ManualClock::new(start_ms));
        Self {
            frames: Rc::new(ManualFrameScheduler::new()),
            intervals: Rc::new(ManualIntervalScheduler::new(Rc::clone(&clock))),
            clock,
        }
    }

    /// Sources to hand to a ticker. All clones share the same state.
    pub fn sources(&self) -> TimingSources {
        TimingSources::new(
            self.frames.clone(),
            self.intervals.clone(),
            self.clock.clone(),
        )
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn frames(&self) -> &ManualFrameScheduler {
        &self.frames
    }

    pub fn intervals(&self) -> &ManualIntervalScheduler {
        &self.intervals
    }

    /// Moves the clock forward by `millis`, firing intervals that come due.
    pub fn advance(&self, millis: f64) -> usize {
        let target = self.clock.now_ms() + millis;
        self.intervals.run_until(target)
    }

    /// Moves the clock forward by `millis` and delivers one frame stamped
    /// with the new clock reading.
    pub fn advance_frame(&self, millis: f64) -> usize {
        self.clock.advance(millis);
        let now = self.clock.now_ms();
        self.frames.fire_frame(Some(now))
    }
}

impl Default for ManualTimingSources {
    fn default() -> Self {
        Self::new()
    }
}
