//! Ticker configuration.
//!
//! Options never fail to apply: values that make no sense for a clock are
//! replaced by their defaults and reported through `log::warn!`.

/// Interval period used when none (or an invalid one) is configured: 60 cycles per second.
pub const DEFAULT_INTERVAL_MS: f64 = 1000.0 / 60.0;

pub const KEY_FRAME_SYNCED: &str = "TICKER_FRAME_SYNCED";
pub const KEY_INTERVAL_MS: &str = "TICKER_INTERVAL_MS";
pub const KEY_PULSE_MS: &str = "TICKER_PULSE_MS";
pub const KEY_AUTO_START: &str = "TICKER_AUTO_START";
pub const KEY_OFFSET_MS: &str = "TICKER_OFFSET_MS";

/// Timing source that drives a ticker. Fixed for the ticker's lifetime.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickerMode {
    /// Driven by one-shot frame callbacks that are re-requested every cycle.
    FrameSynced,
    /// Driven by a recurring timer; timestamps come from the clock.
    IntervalTimer,
}

/// Configuration accepted by [`Ticker::new`](crate::Ticker::new).
#[derive(Clone, Debug, PartialEq)]
pub struct TickerOptions {
    /// Use the frame source instead of the interval source.
    pub frame_synced: bool,
    /// Timer period in milliseconds. Ignored when `frame_synced` is set.
    pub interval_ms: f64,
    /// Fixed delta in milliseconds reported on every cycle. `0` disables it.
    pub pulse_ms: f64,
    /// Start the ticker as soon as it is constructed.
    pub auto_start: bool,
    /// Constant added to every delivered timestamp.
    pub offset_ms: f64,
}

impl Default for TickerOptions {
    fn default() -> Self {
        Self {
            frame_synced: false,
            interval_ms: DEFAULT_INTERVAL_MS,
            pulse_ms: 0.0,
            auto_start: false,
            offset_ms: 0.0,
        }
    }
}

impl TickerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame_synced(mut self, frame_synced: bool) -> Self {
        self.frame_synced = frame_synced;
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: f64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    pub fn with_pulse_ms(mut self, pulse_ms: f64) -> Self {
        self.pulse_ms = pulse_ms;
        self
    }

    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    pub fn with_offset_ms(mut self, offset_ms: f64) -> Self {
        self.offset_ms = offset_ms;
        self
    }

    pub fn mode(&self) -> TickerMode {
        if self.frame_synced {
            TickerMode::FrameSynced
        } else {
            TickerMode::IntervalTimer
        }
    }

    /// Returns the pulse length when pulse mode is enabled.
    pub fn pulse(&self) -> Option<f64> {
        (self.pulse_ms > 0.0).then_some(self.pulse_ms)
    }

    /// Replaces out-of-range values with their defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.interval_ms.is_finite() && self.interval_ms > 0.0) {
            log::warn!(
                "ticker interval {} ms is not a positive period, using {} ms",
                self.interval_ms,
                defaults.interval_ms
            );
            self.interval_ms = defaults.interval_ms;
        }
        if !(self.pulse_ms.is_finite() && self.pulse_ms >= 0.0) {
            log::warn!("ticker pulse {} ms is invalid, disabling pulse", self.pulse_ms);
            self.pulse_ms = defaults.pulse_ms;
        }
        if !self.offset_ms.is_finite() {
            log::warn!("ticker offset {} ms is not finite, using 0", self.offset_ms);
            self.offset_ms = defaults.offset_ms;
        }
        self
    }

    /// Reads options from a string key/value source such as the process
    /// environment. Missing keys keep their defaults; unparsable values are
    /// logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();
        if let Some(value) = read_flag(&lookup, KEY_FRAME_SYNCED) {
            options.frame_synced = value;
        }
        if let Some(value) = read_millis(&lookup, KEY_INTERVAL_MS) {
            options.interval_ms = value;
        }
        if let Some(value) = read_millis(&lookup, KEY_PULSE_MS) {
            options.pulse_ms = value;
        }
        if let Some(value) = read_flag(&lookup, KEY_AUTO_START) {
            options.auto_start = value;
        }
        if let Some(value) = read_millis(&lookup, KEY_OFFSET_MS) {
            options.offset_ms = value;
        }
        options.sanitized()
    }
}

fn read_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    let raw = lookup(key)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        other => {
            log::warn!("ignoring {key}={other:?}: expected a boolean");
            None
        }
    }
}

fn read_millis(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<f64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("ignoring {key}={raw:?}: expected milliseconds");
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/options_tests.rs"]
mod tests;
