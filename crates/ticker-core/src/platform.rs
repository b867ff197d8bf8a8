//! Platform abstraction traits for ticker timing sources.
//!
//! These traits allow a [`Ticker`](crate::Ticker) to delegate frame pacing,
//! recurring timers and wall-clock reads to the host, so the same scheduling
//! logic runs on top of a display-refresh loop, a plain event loop, or a
//! manually driven test harness.

use std::fmt;
use std::rc::Rc;

use crate::{FrameRequestId, IntervalId};

/// Callback handed to a [`FrameScheduler`]; receives the frame timestamp in
/// milliseconds when the source provides one.
pub type FrameCallback = Box<dyn FnOnce(Option<f64>) + 'static>;

/// Callback handed to an [`IntervalScheduler`]; invoked on every period.
pub type IntervalCallback = Rc<dyn Fn() + 'static>;

/// Schedules one-shot callbacks aligned to display frames.
///
/// Every registration fires at most once. Callbacks registered for the same
/// frame must fire in registration order, and callbacks registered while a
/// frame is being delivered belong to the next frame. A request cancelled
/// before its callback runs, even mid-frame, must not run.
pub trait FrameScheduler {
    /// Request that `callback` runs on the next frame.
    fn schedule_frame(&self, callback: FrameCallback) -> FrameRequestId;

    /// Cancel a pending frame request. Unknown or already fired ids are ignored.
    fn cancel_frame(&self, id: FrameRequestId);
}

/// Schedules recurring callbacks at a fixed period.
pub trait IntervalScheduler {
    /// Start invoking `callback` roughly every `period_ms` milliseconds.
    fn schedule_interval(&self, callback: IntervalCallback, period_ms: f64) -> IntervalId;

    /// Stop a recurring callback. Unknown ids are ignored.
    fn cancel_interval(&self, id: IntervalId);
}

/// Provides wall-clock readings in milliseconds.
///
/// Readings only need to be monotonic enough for delta computation.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Bundle of the three timing capabilities a ticker depends on.
#[derive(Clone)]
pub struct TimingSources {
    pub frames: Rc<dyn FrameScheduler>,
    pub intervals: Rc<dyn IntervalScheduler>,
    pub clock: Rc<dyn Clock>,
}

impl TimingSources {
    pub fn new(
        frames: Rc<dyn FrameScheduler>,
        intervals: Rc<dyn IntervalScheduler>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            frames,
            intervals,
            clock,
        }
    }

    /// Builds the bundle from a single host object that provides every capability.
    pub fn from_host<H>(host: Rc<H>) -> Self
    where
        H: FrameScheduler + IntervalScheduler + Clock + 'static,
    {
        Self {
            frames: host.clone(),
            intervals: host.clone(),
            clock: host,
        }
    }
}

impl fmt::Debug for TimingSources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimingSources").finish_non_exhaustive()
    }
}
