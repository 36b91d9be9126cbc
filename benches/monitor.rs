use actmon::{Collector, FilterSet, Level, LevelFilter, MonitorContext};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;

fn bench_rejected_line(c: &mut Criterion) {
    let monitor = MonitorContext::new().create_monitor();
    monitor.set_minimal_filter(FilterSet::RELEASE).expect("set filter");

    c.bench_function("Monitor::trace (rejected)", |b| {
        b.iter(|| {
            monitor.trace(black_box("not interesting")).expect("trace failed");
        });
    });
}

fn bench_accepted_line(c: &mut Criterion) {
    let monitor = MonitorContext::new().create_monitor();
    monitor.set_minimal_filter(FilterSet::VERBOSE).expect("set filter");
    let collector = Arc::new(Collector::new(FilterSet::UNDEFINED, 1024));
    monitor
        .register_bound_client(collector)
        .expect("register failed");

    c.bench_function("Monitor::info (one collector)", |b| {
        b.iter(|| {
            monitor.info(black_box("benchmark line")).expect("info failed");
        });
    });
}

fn bench_group_cycle(c: &mut Criterion) {
    let monitor = MonitorContext::new().create_monitor();
    monitor.set_minimal_filter(FilterSet::TERSE).expect("set filter");

    c.bench_function("Monitor::open_group + close_group", |b| {
        b.iter(|| {
            monitor
                .open_group(black_box(Level::Info), "step")
                .expect("open failed");
            monitor.close_group().expect("close failed");
        });
    });

    c.bench_function("Monitor::open_group rejected", |b| {
        b.iter(|| {
            monitor
                .open_group(black_box(Level::Trace), "hidden")
                .expect("open failed");
            monitor.close_group().expect("close failed");
        });
    });
}

fn bench_resync(c: &mut Criterion) {
    let monitor = MonitorContext::new().create_monitor();
    let collectors: Vec<_> = (0..8)
        .map(|_| Arc::new(Collector::new(FilterSet::uniform(LevelFilter::Warn), 16)))
        .collect();
    for collector in &collectors {
        monitor
            .register_bound_client(collector.clone())
            .expect("register failed");
    }

    c.bench_function("Monitor::actual_filter (8 clients, dirty)", |b| {
        b.iter(|| {
            monitor.signal_change();
            black_box(monitor.actual_filter().expect("resync failed"));
        });
    });
}

criterion_group!(
    benches,
    bench_rejected_line,
    bench_accepted_line,
    bench_group_cycle,
    bench_resync,
);
criterion_main!(benches);
