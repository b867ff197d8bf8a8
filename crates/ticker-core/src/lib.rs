//! Master clock for driving periodic callbacks.
//!
//! A [`Ticker`] owns a set of [`Tick`] callbacks and invokes all of them once
//! per cycle with a shared `(time_stamp, delta_time)` pair. Cycles come from
//! one of two host timing sources, selected at construction:
//!
//! - a [`FrameScheduler`] delivering one-shot, display-aligned frames
//!   ([`TickerMode::FrameSynced`]), or
//! - an [`IntervalScheduler`] firing at a fixed period
//!   ([`TickerMode::IntervalTimer`]).
//!
//! The host supplies both, together with a [`Clock`], through
//! [`TimingSources`]. Everything here runs on a single thread.

mod options;
pub mod platform;
mod registry;
mod tick;
mod ticker;

pub use options::{
    TickerMode, TickerOptions, DEFAULT_INTERVAL_MS, KEY_AUTO_START, KEY_FRAME_SYNCED,
    KEY_INTERVAL_MS, KEY_OFFSET_MS, KEY_PULSE_MS,
};
pub use platform::{
    Clock, FrameCallback, FrameScheduler, IntervalCallback, IntervalScheduler, TimingSources,
};
pub use tick::Tick;
pub use ticker::{Ticker, WeakTicker};

/// Identifier returned by [`FrameScheduler::schedule_frame`].
pub type FrameRequestId = u64;

/// Identifier returned by [`IntervalScheduler::schedule_interval`].
pub type IntervalId = u64;
