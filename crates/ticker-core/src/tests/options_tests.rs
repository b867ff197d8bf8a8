use super::*;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_match_interval_mode_at_sixty_hz() {
    let options = TickerOptions::default();
    assert_eq!(options.mode(), TickerMode::IntervalTimer);
    assert!((options.interval_ms - 16.666_666).abs() < 1e-3);
    assert_eq!(options.pulse(), None);
    assert!(!options.auto_start);
    assert_eq!(options.offset_ms, 0.0);
}

#[test]
fn builder_sets_every_option() {
    let options = TickerOptions::new()
        .with_frame_synced(true)
        .with_interval_ms(5.0)
        .with_pulse_ms(16.0)
        .with_auto_start(true)
        .with_offset_ms(100.0);

    assert_eq!(options.mode(), TickerMode::FrameSynced);
    assert_eq!(options.interval_ms, 5.0);
    assert_eq!(options.pulse(), Some(16.0));
    assert!(options.auto_start);
    assert_eq!(options.offset_ms, 100.0);
}

#[test]
fn sanitized_falls_back_to_defaults() {
    let options = TickerOptions::new()
        .with_interval_ms(0.0)
        .with_pulse_ms(-3.0)
        .with_offset_ms(f64::NAN)
        .sanitized();

    assert_eq!(options.interval_ms, DEFAULT_INTERVAL_MS);
    assert_eq!(options.pulse_ms, 0.0);
    assert_eq!(options.offset_ms, 0.0);

    let infinite = TickerOptions::new()
        .with_interval_ms(f64::INFINITY)
        .with_pulse_ms(f64::INFINITY)
        .sanitized();
    assert_eq!(infinite.interval_ms, DEFAULT_INTERVAL_MS);
    assert_eq!(infinite.pulse(), None);
}

#[test]
fn sanitized_keeps_valid_values() {
    let options = TickerOptions::new()
        .with_interval_ms(8.0)
        .with_pulse_ms(4.0)
        .with_offset_ms(-250.0);
    assert_eq!(options.clone().sanitized(), options);
}

#[test]
fn from_lookup_parses_known_keys() {
    let options = TickerOptions::from_lookup(lookup_from(&[
        (KEY_FRAME_SYNCED, "true"),
        (KEY_INTERVAL_MS, " 10 "),
        (KEY_PULSE_MS, "16"),
        (KEY_AUTO_START, "YES"),
        (KEY_OFFSET_MS, "2.5"),
    ]));

    assert!(options.frame_synced);
    assert_eq!(options.interval_ms, 10.0);
    assert_eq!(options.pulse_ms, 16.0);
    assert!(options.auto_start);
    assert_eq!(options.offset_ms, 2.5);
}

#[test]
fn from_lookup_ignores_malformed_values() {
    let options = TickerOptions::from_lookup(lookup_from(&[
        (KEY_FRAME_SYNCED, "maybe"),
        (KEY_INTERVAL_MS, "fast"),
        (KEY_PULSE_MS, "-1"),
        (KEY_AUTO_START, "0"),
    ]));

    assert_eq!(options, TickerOptions::default());
}

#[test]
fn from_lookup_with_no_keys_is_default() {
    let options = TickerOptions::from_lookup(|_| None);
    assert_eq!(options, TickerOptions::default());
}
