use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::options::{TickerMode, TickerOptions};
use crate::platform::{IntervalCallback, TimingSources};
use crate::registry::TickRegistry;
use crate::{FrameRequestId, IntervalId, Tick};

/// Registration currently held with a timing source.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SourceHandle {
    Frame(FrameRequestId),
    Interval(IntervalId),
}

struct TickerInner {
    sources: TimingSources,
    options: TickerOptions,
    mode: TickerMode,
    pulse_ms: Option<f64>,
    registry: RefCell<TickRegistry>,
    active: Cell<bool>,
    handle: Cell<Option<SourceHandle>>,
    /// Bumped on every registration. Firings carrying an older value are
    /// stale: the source had them in flight when they were superseded.
    generation: Cell<u64>,
    base_request: Cell<Option<FrameRequestId>>,
    base_time_ms: Cell<f64>,
    last_time_stamp_ms: Cell<f64>,
    cycle_count: Cell<u64>,
}

impl TickerInner {
    fn new(options: TickerOptions, sources: TimingSources) -> Self {
        Self {
            sources,
            mode: options.mode(),
            pulse_ms: options.pulse(),
            options,
            registry: RefCell::new(TickRegistry::new()),
            active: Cell::new(false),
            handle: Cell::new(None),
            generation: Cell::new(0),
            base_request: Cell::new(None),
            base_time_ms: Cell::new(0.0),
            last_time_stamp_ms: Cell::new(0.0),
            cycle_count: Cell::new(0),
        }
    }

    /// Frame timestamps and clock readings are not comparable, so in frame
    /// mode the base time comes from the first delivered frame.
    fn capture_base_on_first_frame(this: &Rc<Self>) {
        let weak = Rc::downgrade(this);
        let id = this.sources.frames.schedule_frame(Box::new(move |frame_time| {
            if let Some(inner) = weak.upgrade() {
                inner.base_request.set(None);
                let base = inner.frame_time_or_now(frame_time);
                inner.base_time_ms.set(base);
            }
        }));
        this.base_request.set(Some(id));
    }

    fn frame_time_or_now(&self, frame_time: Option<f64>) -> f64 {
        match frame_time {
            Some(time) if time.is_finite() => time,
            _ => self.sources.clock.now_ms(),
        }
    }

    fn next_generation(&self) -> u64 {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        generation
    }

    fn request_frame(this: &Rc<Self>) -> FrameRequestId {
        let weak = Rc::downgrade(this);
        let generation = this.next_generation();
        this.sources.frames.schedule_frame(Box::new(move |frame_time| {
            if let Some(inner) = weak.upgrade() {
                TickerInner::enter_frame(&inner, generation, frame_time);
            }
        }))
    }

    fn schedule_interval(this: &Rc<Self>) -> IntervalId {
        let weak = Rc::downgrade(this);
        let generation = this.next_generation();
        let callback: IntervalCallback = Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                TickerInner::enter_frame(&inner, generation, None);
            }
        });
        this.sources
            .intervals
            .schedule_interval(callback, this.options.interval_ms)
    }

    fn cancel(&self, handle: SourceHandle) {
        match handle {
            SourceHandle::Frame(id) => self.sources.frames.cancel_frame(id),
            SourceHandle::Interval(id) => self.sources.intervals.cancel_interval(id),
        }
    }

    fn enter_frame(this: &Rc<Self>, generation: u64, frame_time: Option<f64>) {
        // A firing can still arrive after stop() or a restart when the source
        // had it in flight.
        if !this.active.get() || generation != this.generation.get() {
            log::trace!("ignoring stale ticker firing");
            return;
        }
        if this.mode == TickerMode::FrameSynced {
            let id = Self::request_frame(this);
            this.handle.set(Some(SourceHandle::Frame(id)));
        }
        if this.registry.borrow().live_count() == 0 {
            this.compact();
            return;
        }

        let raw = match (this.mode, frame_time) {
            (TickerMode::FrameSynced, Some(time)) if time.is_finite() => time,
            _ => this.sources.clock.now_ms(),
        } - this.base_time_ms.get();
        let (time_stamp, delta_time) = this.advance(raw);
        let time_stamp = time_stamp + this.options.offset_ms;
        log::trace!("ticker cycle at {time_stamp:.3} ms (delta {delta_time:.3} ms)");

        // Ticks registered during this loop land past `slot_count` and first
        // run on the next cycle.
        let slot_count = this.registry.borrow().slot_count();
        for index in 0..slot_count {
            let tick = this.registry.borrow().get(index);
            if let Some(tick) = tick {
                tick.invoke(time_stamp, delta_time);
            }
        }

        this.compact();
    }

    fn compact(&self) {
        let mut registry = self.registry.borrow_mut();
        if registry.needs_compaction() {
            let removed = registry.compact();
            log::debug!("ticker compacted {removed} removed tick slot(s)");
        }
    }

    /// Computes the pre-offset `(time_stamp, delta_time)` for a cycle and
    /// records the timestamp.
    fn advance(&self, raw: f64) -> (f64, f64) {
        let last = self.last_time_stamp_ms.get();
        let (time_stamp, delta_time) = match self.pulse_ms {
            Some(pulse) => {
                let count = self.cycle_count.get();
                self.cycle_count.set(count + 1);
                if count == 0 {
                    (raw.max(last), pulse)
                } else {
                    (last + pulse, pulse)
                }
            }
            None => {
                let time_stamp = raw.max(last);
                (time_stamp, time_stamp - last)
            }
        };
        self.last_time_stamp_ms.set(time_stamp);
        (time_stamp, delta_time)
    }
}

impl Drop for TickerInner {
    fn drop(&mut self) {
        if let Some(id) = self.base_request.take() {
            self.sources.frames.cancel_frame(id);
        }
        if let Some(handle) = self.handle.take() {
            self.cancel(handle);
        }
    }
}

/// Master clock that drives registered [`Tick`]s from a frame source or an
/// interval timer.
///
/// Every cycle delivers the same `(time_stamp, delta_time)` pair, in
/// milliseconds, to each live tick in registration order. Ticks may be
/// added or removed from inside a tick; removal is lazy and the registry is
/// compacted after the cycle.
///
/// `Ticker` is a cheap handle over shared single-threaded state. Dropping the
/// last handle cancels any live timing source registration. Ticks that need
/// to reach their own ticker should capture a [`WeakTicker`] to avoid a
/// reference cycle.
#[derive(Clone)]
pub struct Ticker {
    inner: Rc<TickerInner>,
}

impl Ticker {
    /// Creates a ticker with the given initial ticks.
    ///
    /// Invalid option values fall back to their defaults. In interval mode
    /// the base time is read from the clock here; in frame-synced mode it is
    /// taken from the first delivered frame, so [`now`](Self::now) is not
    /// meaningful before that frame.
    pub fn new(
        ticks: impl IntoIterator<Item = Tick>,
        options: TickerOptions,
        sources: TimingSources,
    ) -> Self {
        let options = options.sanitized();
        let auto_start = options.auto_start;
        let inner = Rc::new(TickerInner::new(options, sources));
        match inner.mode {
            TickerMode::IntervalTimer => inner.base_time_ms.set(inner.sources.clock.now_ms()),
            TickerMode::FrameSynced => TickerInner::capture_base_on_first_frame(&inner),
        }
        {
            let mut registry = inner.registry.borrow_mut();
            for tick in ticks {
                registry.insert(tick);
            }
        }

        let ticker = Self { inner };
        if auto_start {
            ticker.start();
        }
        ticker
    }

    /// Starts the scheduling loop. Does nothing while already active.
    pub fn start(&self) {
        let inner = &self.inner;
        if inner.active.get() {
            return;
        }
        inner.active.set(true);
        let handle = match inner.mode {
            TickerMode::FrameSynced => SourceHandle::Frame(TickerInner::request_frame(inner)),
            TickerMode::IntervalTimer => {
                SourceHandle::Interval(TickerInner::schedule_interval(inner))
            }
        };
        inner.handle.set(Some(handle));
        log::debug!("ticker started ({:?})", inner.mode);
    }

    /// Stops the scheduling loop. Does nothing while inactive.
    ///
    /// Stopping from inside a tick lets the current cycle finish but
    /// prevents any further cycle.
    pub fn stop(&self) {
        let inner = &self.inner;
        if !inner.active.get() {
            return;
        }
        inner.active.set(false);
        if let Some(handle) = inner.handle.take() {
            inner.cancel(handle);
        }
        log::debug!("ticker stopped ({:?})", inner.mode);
    }

    /// Registers `tick`. Registering a tick that is already live is a no-op.
    pub fn on(&self, tick: &Tick) {
        self.inner.registry.borrow_mut().insert(tick.clone());
    }

    /// Unregisters `tick`. The slot is tombstoned and dropped at the end of
    /// the next cycle.
    pub fn off(&self, tick: &Tick) {
        self.inner.registry.borrow_mut().remove(tick);
    }

    pub fn has(&self, tick: &Tick) -> bool {
        self.inner.registry.borrow().contains(tick)
    }

    /// Unregisters every tick.
    pub fn clear(&self) {
        self.inner.registry.borrow_mut().clear();
    }

    /// Milliseconds elapsed since the base time. Not affected by the offset.
    pub fn now(&self) -> f64 {
        self.inner.sources.clock.now_ms() - self.inner.base_time_ms.get()
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// Timestamp delivered on the last cycle, offset included.
    pub fn last_time_stamp(&self) -> f64 {
        self.inner.last_time_stamp_ms.get() + self.inner.options.offset_ms
    }

    /// Live ticks in invocation order.
    pub fn ticks(&self) -> Vec<Tick> {
        self.inner.registry.borrow().live()
    }

    pub fn mode(&self) -> TickerMode {
        self.inner.mode
    }

    /// Options in effect after sanitizing.
    pub fn options(&self) -> &TickerOptions {
        &self.inner.options
    }

    pub fn downgrade(&self) -> WeakTicker {
        WeakTicker {
            inner: Rc::downgrade(&self.inner),
        }
    }

    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.inner.registry.borrow().slot_count()
    }
}

impl fmt::Debug for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticker")
            .field("mode", &self.inner.mode)
            .field("active", &self.inner.active.get())
            .field("ticks", &self.inner.registry.borrow().live_count())
            .field("last_time_stamp", &self.last_time_stamp())
            .finish()
    }
}

/// Non-owning handle to a [`Ticker`].
#[derive(Clone, Default)]
pub struct WeakTicker {
    inner: Weak<TickerInner>,
}

impl WeakTicker {
    pub fn upgrade(&self) -> Option<Ticker> {
        self.inner.upgrade().map(|inner| Ticker { inner })
    }
}

impl fmt::Debug for WeakTicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakTicker")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/ticker_tests.rs"]
mod tests;
