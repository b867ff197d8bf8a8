//! Standard timing sources backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the platform traits
//! defined in `ticker-core`. [`StdRuntime`] is a small single-threaded event
//! loop: frames are paced at a fixed period, intervals are repeating timers,
//! and the host drives everything with [`StdRuntime::run_once`] or one of the
//! `run_*` helpers.

mod collections;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use smallvec::SmallVec;
use ticker_core::{
    Clock, FrameCallback, FrameRequestId, FrameScheduler, IntervalCallback, IntervalId,
    IntervalScheduler, TimingSources, DEFAULT_INTERVAL_MS,
};

use crate::collections::map::HashMap;

/// Shortest interval period the runtime accepts.
const MIN_PERIOD_MS: f64 = 1.0;

/// Clock implementation backed by [`std::time::Instant`].
///
/// Readings are milliseconds since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: Instant,
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Returns the elapsed time as a [`Duration`] for convenience.
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

struct FrameEntry {
    id: FrameRequestId,
    callback: FrameCallback,
}

struct Timer {
    period_ms: f64,
    next_due_ms: f64,
    callback: IntervalCallback,
}

struct StdRuntimeInner {
    clock: StdClock,
    frame_period_ms: f64,
    frames: RefCell<VecDeque<FrameEntry>>,
    /// Boundary at which the queued frame requests fire.
    next_frame_ms: Cell<Option<f64>>,
    timers: RefCell<HashMap<IntervalId, Timer>>,
    next_id: Cell<u64>,
}

impl StdRuntimeInner {
    fn next_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    /// First frame boundary strictly after `now_ms`.
    fn frame_boundary_after(&self, now_ms: f64) -> f64 {
        ((now_ms / self.frame_period_ms).floor() + 1.0) * self.frame_period_ms
    }

    fn next_deadline(&self) -> Option<f64> {
        let frame = self.next_frame_ms.get();
        let timer = self
            .timers
            .borrow()
            .values()
            .map(|timer| timer.next_due_ms)
            .min_by(f64::total_cmp);
        match (frame, timer) {
            (Some(frame), Some(timer)) => Some(frame.min(timer)),
            (frame, timer) => frame.or(timer),
        }
    }

    fn dispatch_frames(&self, now_ms: f64) -> usize {
        let boundary = match self.next_frame_ms.get() {
            Some(boundary) if boundary <= now_ms => boundary,
            _ => return 0,
        };
        // Requests made while this frame is delivered go to the next boundary.
        // So do entries left behind when a callback panics.
        self.next_frame_ms
            .set(Some(self.frame_boundary_after(boundary.max(now_ms))));
        let Some(last_id) = self.frames.borrow().back().map(|entry| entry.id) else {
            self.next_frame_ms.set(None);
            return 0;
        };
        log::trace!("delivering frame at {boundary:.3} ms");
        let mut count = 0;
        while let Some(entry) = self.pop_frame_up_to(last_id) {
            (entry.callback)(Some(boundary));
            count += 1;
        }
        if self.frames.borrow().is_empty() {
            self.next_frame_ms.set(None);
        }
        count
    }

    /// Pops the oldest queued frame request if it belongs to the batch ending
    /// at `last_id`. Cancelled entries are already gone from the queue.
    fn pop_frame_up_to(&self, last_id: FrameRequestId) -> Option<FrameEntry> {
        let mut frames = self.frames.borrow_mut();
        if frames.front().is_some_and(|entry| entry.id <= last_id) {
            frames.pop_front()
        } else {
            None
        }
    }

    fn dispatch_timers(&self, now_ms: f64) -> usize {
        let mut due: SmallVec<[(f64, IntervalId); 4]> = self
            .timers
            .borrow()
            .iter()
            .filter(|(_, timer)| timer.next_due_ms <= now_ms)
            .map(|(id, timer)| (timer.next_due_ms, *id))
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut fired = 0;
        for (_, id) in due {
            // An earlier callback may have cancelled this timer.
            let callback = {
                let mut timers = self.timers.borrow_mut();
                let Some(timer) = timers.get_mut(&id) else {
                    continue;
                };
                timer.next_due_ms += timer.period_ms;
                if timer.next_due_ms <= now_ms {
                    // Missed periods coalesce into this single firing.
                    timer.next_due_ms = now_ms + timer.period_ms;
                }
                Rc::clone(&timer.callback)
            };
            callback();
            fired += 1;
        }
        fired
    }
}

/// Single-threaded event loop providing every timing capability a ticker
/// needs.
///
/// Cloning is cheap; clones share the same queues.
#[derive(Clone)]
pub struct StdRuntime {
    inner: Rc<StdRuntimeInner>,
}

impl StdRuntime {
    /// Creates a runtime pacing frames at roughly 60 Hz.
    pub fn new() -> Self {
        Self::with_frame_period(DEFAULT_INTERVAL_MS)
    }

    /// Creates a runtime whose frames fire every `frame_period_ms`.
    ///
    /// Non-finite or non-positive periods fall back to the 60 Hz default.
    pub fn with_frame_period(frame_period_ms: f64) -> Self {
        let frame_period_ms = if frame_period_ms.is_finite() && frame_period_ms > 0.0 {
            frame_period_ms
        } else {
            log::warn!("invalid frame period {frame_period_ms}, using {DEFAULT_INTERVAL_MS} ms");
            DEFAULT_INTERVAL_MS
        };
        Self {
            inner: Rc::new(StdRuntimeInner {
                clock: StdClock::new(),
                frame_period_ms,
                frames: RefCell::new(VecDeque::new()),
                next_frame_ms: Cell::new(None),
                timers: RefCell::new(HashMap::default()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Returns the timing sources to hand to a ticker.
    pub fn timing_sources(&self) -> TimingSources {
        TimingSources::from_host(Rc::new(self.clone()))
    }

    /// Returns the clock implementation.
    pub fn clock(&self) -> StdClock {
        self.inner.clock
    }

    pub fn frame_period_ms(&self) -> f64 {
        self.inner.frame_period_ms
    }

    /// Returns whether any frame request or timer is outstanding.
    pub fn has_pending_work(&self) -> bool {
        !self.inner.frames.borrow().is_empty() || !self.inner.timers.borrow().is_empty()
    }

    pub fn pending_frames(&self) -> usize {
        self.inner.frames.borrow().len()
    }

    pub fn active_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Sleeps until the next frame boundary or timer deadline and dispatches
    /// everything due at that point: frames first, then timers in due order.
    ///
    /// Returns `false` without blocking when nothing is pending.
    pub fn run_once(&self) -> bool {
        let Some(deadline) = self.inner.next_deadline() else {
            return false;
        };
        let now = self.inner.clock.now_ms();
        if deadline > now {
            sleep_ms(deadline - now);
        }
        let now = self.inner.clock.now_ms().max(deadline);
        let frames = self.inner.dispatch_frames(now);
        let timers = self.inner.dispatch_timers(now);
        log::trace!("dispatched {frames} frame callback(s) and {timers} timer(s)");
        true
    }

    /// Runs the loop for `duration`, returning the number of dispatch passes.
    ///
    /// Always blocks for the full duration, even when nothing is pending.
    pub fn run_for(&self, duration: Duration) -> usize {
        let end = self.inner.clock.now_ms() + duration.as_secs_f64() * 1000.0;
        let mut passes = 0;
        loop {
            match self.inner.next_deadline() {
                Some(deadline) if deadline <= end => {
                    self.run_once();
                    passes += 1;
                }
                _ => {
                    let now = self.inner.clock.now_ms();
                    if end > now {
                        sleep_ms(end - now);
                    }
                    break;
                }
            }
        }
        log::debug!("run_for finished after {passes} pass(es)");
        passes
    }

    /// Runs the loop until `done` returns `true` or `timeout` elapses.
    ///
    /// Returns the final value of `done`. Stops early once no work is
    /// pending, since nothing could change the outcome after that.
    pub fn run_until(&self, mut done: impl FnMut() -> bool, timeout: Duration) -> bool {
        let end = self.inner.clock.now_ms() + timeout.as_secs_f64() * 1000.0;
        loop {
            if done() {
                return true;
            }
            match self.inner.next_deadline() {
                Some(deadline) if deadline <= end => {
                    self.run_once();
                }
                Some(_) => {
                    let now = self.inner.clock.now_ms();
                    if end > now {
                        sleep_ms(end - now);
                    }
                    return done();
                }
                None => return false,
            }
        }
    }
}

fn sleep_ms(millis: f64) {
    thread::sleep(Duration::from_secs_f64(millis / 1000.0));
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("frame_period_ms", &self.inner.frame_period_ms)
            .field("pending_frames", &self.pending_frames())
            .field("active_timers", &self.active_timers())
            .finish()
    }
}

impl FrameScheduler for StdRuntime {
    fn schedule_frame(&self, callback: FrameCallback) -> FrameRequestId {
        let inner = &self.inner;
        let id = inner.next_id();
        inner
            .frames
            .borrow_mut()
            .push_back(FrameEntry { id, callback });
        if inner.next_frame_ms.get().is_none() {
            let boundary = inner.frame_boundary_after(inner.clock.now_ms());
            inner.next_frame_ms.set(Some(boundary));
        }
        id
    }

    fn cancel_frame(&self, id: FrameRequestId) {
        let inner = &self.inner;
        let mut frames = inner.frames.borrow_mut();
        if let Some(index) = frames.iter().position(|entry| entry.id == id) {
            frames.remove(index);
        }
        if frames.is_empty() {
            inner.next_frame_ms.set(None);
        }
    }
}

impl IntervalScheduler for StdRuntime {
    fn schedule_interval(&self, callback: IntervalCallback, period_ms: f64) -> IntervalId {
        let inner = &self.inner;
        let period_ms = if period_ms >= MIN_PERIOD_MS {
            period_ms
        } else {
            log::warn!("interval period {period_ms} ms below minimum, using {MIN_PERIOD_MS} ms");
            MIN_PERIOD_MS
        };
        let id = inner.next_id();
        inner.timers.borrow_mut().insert(
            id,
            Timer {
                period_ms,
                next_due_ms: inner.clock.now_ms() + period_ms,
                callback,
            },
        );
        log::debug!("scheduled interval {id} every {period_ms:.3} ms");
        id
    }

    fn cancel_interval(&self, id: IntervalId) {
        if self.inner.timers.borrow_mut().remove(&id).is_some() {
            log::debug!("cancelled interval {id}");
        }
    }
}

impl Clock for StdRuntime {
    fn now_ms(&self) -> f64 {
        self.inner.clock.now_ms()
    }
}

#[cfg(test)]
#[path = "tests/std_runtime_tests.rs"]
mod tests;
