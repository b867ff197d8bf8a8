use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ticker_core::{Tick, Ticker, TickerOptions};
use ticker_testing::ManualTimingSources;

fn summing_ticks(count: usize, sink: &Rc<Cell<f64>>) -> Vec<Tick> {
    (0..count)
        .map(|_| {
            let sink = Rc::clone(sink);
            Tick::new(move |time, delta| sink.set(sink.get() + time + delta))
        })
        .collect()
}

fn interval_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("interval_cycle");
    for count in [1usize, 16, 256] {
        let host = ManualTimingSources::new();
        let sink = Rc::new(Cell::new(0.0));
        let _ticker = Ticker::new(
            summing_ticks(count, &sink),
            TickerOptions::default()
                .with_interval_ms(1.0)
                .with_auto_start(true),
            host.sources(),
        );
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(host.advance(1.0)));
        });
        black_box(sink.get());
    }
    group.finish();
}

fn frame_cycle_with_churn(c: &mut Criterion) {
    let host = ManualTimingSources::new();
    let sink = Rc::new(Cell::new(0.0));
    let ticker = Ticker::new(
        summing_ticks(64, &sink),
        TickerOptions::default()
            .with_frame_synced(true)
            .with_auto_start(true),
        host.sources(),
    );
    let extra = summing_ticks(8, &sink);

    c.bench_function("frame_cycle_with_churn", |b| {
        b.iter(|| {
            for tick in &extra {
                ticker.on(tick);
            }
            for tick in &extra {
                ticker.off(tick);
            }
            black_box(host.advance_frame(16.0));
        });
    });
}

criterion_group!(benches, interval_cycle, frame_cycle_with_churn);
criterion_main!(benches);
