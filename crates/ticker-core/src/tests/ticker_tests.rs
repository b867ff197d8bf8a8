use super::*;
use crate::platform::{Clock, FrameCallback, FrameScheduler, IntervalScheduler};
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

#[derive(Default)]
struct StepSources {
    now: Cell<f64>,
    next_id: Cell<u64>,
    frames: RefCell<Vec<(u64, FrameCallback)>>,
    intervals: RefCell<Vec<(u64, IntervalCallback)>>,
}

impl StepSources {
    fn next_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    fn step(&self, millis: f64) {
        self.now.set(self.now.get() + millis);
        let callbacks: Vec<IntervalCallback> = self
            .intervals
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    fn fire_frame(&self, time: f64) {
        let pending: Vec<(u64, FrameCallback)> = self.frames.borrow_mut().drain(..).collect();
        for (_, callback) in pending {
            callback(Some(time));
        }
    }
}

impl FrameScheduler for StepSources {
    fn schedule_frame(&self, callback: FrameCallback) -> FrameRequestId {
        let id = self.next_id();
        self.frames.borrow_mut().push((id, callback));
        id
    }

    fn cancel_frame(&self, id: FrameRequestId) {
        self.frames.borrow_mut().retain(|(pending, _)| *pending != id);
    }
}

impl IntervalScheduler for StepSources {
    fn schedule_interval(&self, callback: IntervalCallback, _period_ms: f64) -> IntervalId {
        let id = self.next_id();
        self.intervals.borrow_mut().push((id, callback));
        id
    }

    fn cancel_interval(&self, id: IntervalId) {
        self.intervals.borrow_mut().retain(|(live, _)| *live != id);
    }
}

impl Clock for StepSources {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

fn sources() -> (Rc<StepSources>, TimingSources) {
    let host = Rc::new(StepSources::default());
    (Rc::clone(&host), TimingSources::from_host(host))
}

fn counting_tick(counter: &Rc<Cell<u32>>) -> Tick {
    let counter = Rc::clone(counter);
    Tick::new(move |_, _| counter.set(counter.get() + 1))
}

#[test]
fn removed_slot_is_kept_until_the_next_cycle() {
    let (host, sources) = sources();
    let count = Rc::new(Cell::new(0));
    let a = counting_tick(&count);
    let b = counting_tick(&count);
    let c = counting_tick(&count);
    let ticker = Ticker::new(
        [a.clone(), b.clone(), c.clone()],
        TickerOptions::default().with_auto_start(true),
        sources,
    );

    ticker.off(&b);
    assert_eq!(ticker.slot_count(), 3);
    assert_eq!(ticker.ticks(), vec![a.clone(), c.clone()]);

    host.step(16.0);

    assert_eq!(count.get(), 2);
    assert_eq!(ticker.slot_count(), 2);
    assert_eq!(ticker.ticks(), vec![a, c]);
}

#[test]
fn self_removal_is_compacted_in_the_same_cycle() {
    let (host, sources) = sources();
    let ticker = Ticker::new([], TickerOptions::default(), sources);
    let calls = Rc::new(Cell::new(0));
    let slot: Rc<RefCell<Option<Tick>>> = Rc::new(RefCell::new(None));
    let tick = {
        let weak = ticker.downgrade();
        let calls = Rc::clone(&calls);
        let slot = Rc::clone(&slot);
        Tick::new(move |_, _| {
            calls.set(calls.get() + 1);
            if let (Some(ticker), Some(me)) = (weak.upgrade(), slot.borrow().as_ref()) {
                ticker.off(me);
            }
        })
    };
    slot.borrow_mut().replace(tick.clone());
    ticker.on(&tick);
    ticker.start();

    host.step(16.0);
    host.step(16.0);

    assert_eq!(calls.get(), 1);
    assert_eq!(ticker.slot_count(), 0);
    assert!(!ticker.has(&tick));
}

#[test]
fn panicking_tick_leaves_the_ticker_usable() {
    let (host, sources) = sources();
    let armed = Rc::new(Cell::new(true));
    let after = Rc::new(Cell::new(0));
    let bomb = {
        let armed = Rc::clone(&armed);
        Tick::new(move |_, _| {
            if armed.get() {
                panic!("tick failed");
            }
        })
    };
    let survivor = counting_tick(&after);
    let ticker = Ticker::new(
        [bomb, survivor],
        TickerOptions::default().with_auto_start(true),
        sources,
    );

    let result = panic::catch_unwind(AssertUnwindSafe(|| host.step(16.0)));
    assert!(result.is_err());
    assert_eq!(after.get(), 0, "panic aborts the rest of the cycle");
    assert!(ticker.is_active());

    armed.set(false);
    host.step(16.0);
    assert_eq!(after.get(), 1);
    assert_eq!(ticker.last_time_stamp(), 32.0);
}

#[test]
fn dropping_the_last_handle_cancels_the_interval() {
    let (host, sources) = sources();
    let ticker = Ticker::new([], TickerOptions::default(), sources);
    ticker.start();
    assert_eq!(host.intervals.borrow().len(), 1);

    let weak = ticker.downgrade();
    drop(ticker);

    assert!(weak.upgrade().is_none());
    assert!(host.intervals.borrow().is_empty());
}

#[test]
fn dropping_before_the_first_frame_cancels_the_base_request() {
    let (host, sources) = sources();
    let ticker = Ticker::new(
        [],
        TickerOptions::default()
            .with_frame_synced(true)
            .with_auto_start(true),
        sources,
    );
    assert_eq!(host.frames.borrow().len(), 2);

    drop(ticker);
    assert!(host.frames.borrow().is_empty());
}

#[test]
fn frame_mode_base_time_comes_from_the_first_frame() {
    let (host, sources) = sources();
    host.now.set(5_000.0);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let tick = {
        let seen = Rc::clone(&seen);
        Tick::new(move |time, delta| seen.borrow_mut().push((time, delta)))
    };
    let ticker = Ticker::new(
        [tick],
        TickerOptions::default()
            .with_frame_synced(true)
            .with_auto_start(true),
        sources,
    );

    host.fire_frame(1_000.0);
    host.fire_frame(1_016.0);

    assert_eq!(*seen.borrow(), vec![(0.0, 0.0), (16.0, 16.0)]);
    assert_eq!(host.frames.borrow().len(), 1, "next frame requested");
    assert!(ticker.is_active());
}

#[test]
fn restart_from_an_earlier_frame_callback_ignores_the_superseded_request() {
    let (host, sources) = sources();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let tick = {
        let seen = Rc::clone(&seen);
        Tick::new(move |time, delta| seen.borrow_mut().push((time, delta)))
    };
    let ticker = Ticker::new(
        [tick],
        TickerOptions::default().with_frame_synced(true),
        sources,
    );
    let restarter = {
        let weak = ticker.downgrade();
        move |_: Option<f64>| {
            if let Some(ticker) = weak.upgrade() {
                ticker.stop();
                ticker.start();
            }
        }
    };
    host.schedule_frame(Box::new(restarter));
    ticker.start();

    // This source hands out the whole batch before running it, so the
    // ticker's original request still fires after the restart.
    host.fire_frame(0.0);
    assert!(seen.borrow().is_empty());
    assert_eq!(host.frames.borrow().len(), 1);

    host.fire_frame(16.0);
    assert_eq!(*seen.borrow(), vec![(16.0, 16.0)]);
    assert_eq!(host.frames.borrow().len(), 1);

    ticker.stop();
    assert!(host.frames.borrow().is_empty());
}

#[test]
fn tombstones_are_compacted_while_no_tick_is_live() {
    let (host, sources) = sources();
    let ticker = Ticker::new(
        [],
        TickerOptions::default().with_auto_start(true),
        sources,
    );
    let tick = Tick::new(|_, _| {});

    for _ in 0..1000 {
        ticker.on(&tick);
        ticker.off(&tick);
        host.step(16.0);
    }

    assert_eq!(ticker.slot_count(), 0);
    assert!(ticker.ticks().is_empty());
}
