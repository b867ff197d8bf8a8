//! Testing utilities for driving tickers deterministically.
//!
//! The manual sources here implement the `ticker-core` platform traits
//! without any real time passing: tests decide when frames arrive, what
//! timestamp they carry, and how far the clock moves.

pub mod clock;
pub mod frames;
pub mod harness;
pub mod intervals;
pub mod recorder;

pub use clock::ManualClock;
pub use frames::ManualFrameScheduler;
pub use harness::ManualTimingSources;
pub use intervals::ManualIntervalScheduler;
pub use recorder::TickRecorder;

pub mod prelude {
    pub use crate::clock::ManualClock;
    pub use crate::frames::ManualFrameScheduler;
    pub use crate::harness::ManualTimingSources;
    pub use crate::intervals::ManualIntervalScheduler;
    pub use crate::recorder::TickRecorder;
}
