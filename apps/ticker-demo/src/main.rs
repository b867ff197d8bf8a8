use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Context};
use ticker_core::{Tick, Ticker, TickerOptions};
use ticker_runtime_std::StdRuntime;

const DEFAULT_RUN_MS: u64 = 1_000;
const WARMUP_CYCLES: u32 = 5;

fn run_duration() -> anyhow::Result<Duration> {
    let Some(arg) = std::env::args().nth(1) else {
        return Ok(Duration::from_millis(DEFAULT_RUN_MS));
    };
    let millis: u64 = arg
        .parse()
        .with_context(|| format!("run duration must be whole milliseconds, got {arg:?}"))?;
    if millis == 0 {
        bail!("run duration must be positive");
    }
    Ok(Duration::from_millis(millis))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let duration = run_duration()?;
    let options = TickerOptions::from_lookup(|key| std::env::var(key).ok());
    let runtime = StdRuntime::new();
    let ticker = Ticker::new(Vec::new(), options, runtime.timing_sources());
    log::info!("running {:?} ticker for {duration:?}", ticker.mode());

    let cycles = Rc::new(Cell::new(0u32));
    let largest_delta = Rc::new(Cell::new(0.0f64));
    let counter = {
        let cycles = Rc::clone(&cycles);
        let largest_delta = Rc::clone(&largest_delta);
        Tick::new(move |time_stamp, delta_time| {
            cycles.set(cycles.get() + 1);
            largest_delta.set(largest_delta.get().max(delta_time));
            log::debug!("cycle {} at {time_stamp:.2} ms (+{delta_time:.2} ms)", cycles.get());
        })
    };

    // Removes itself once it has seen a few cycles.
    let warmup_slot: Rc<RefCell<Option<Tick>>> = Rc::new(RefCell::new(None));
    let warmup = {
        let weak = ticker.downgrade();
        let seen = Cell::new(0u32);
        let slot = Rc::clone(&warmup_slot);
        Tick::new(move |time_stamp, _| {
            seen.set(seen.get() + 1);
            if seen.get() < WARMUP_CYCLES {
                return;
            }
            log::info!("warmup finished at {time_stamp:.2} ms");
            if let (Some(ticker), Some(me)) = (weak.upgrade(), slot.borrow_mut().take()) {
                ticker.off(&me);
            }
        })
    };
    warmup_slot.borrow_mut().replace(warmup.clone());

    ticker.on(&counter);
    ticker.on(&warmup);
    ticker.start();

    runtime.run_for(duration);
    ticker.stop();

    log::info!(
        "{} cycles, last timestamp {:.2} ms, largest delta {:.2} ms, {} tick(s) still registered",
        cycles.get(),
        ticker.last_time_stamp(),
        largest_delta.get(),
        ticker.ticks().len(),
    );
    Ok(())
}
