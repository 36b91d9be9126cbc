use actmon::{
    BridgeRelay, Collector, FilterSet, Level, LineData, LogTime, MonitorContext, RelayOptions,
    WireLine,
};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;

fn bench_relay_line(c: &mut Criterion) {
    let source = MonitorContext::new().create_monitor();
    let target = MonitorContext::new().create_monitor();
    target.set_minimal_filter(FilterSet::VERBOSE).expect("set filter");
    target
        .register_bound_client(Arc::new(Collector::new(FilterSet::UNDEFINED, 1024)))
        .expect("register failed");
    let relay = BridgeRelay::new(target.bridge_target(), RelayOptions::default());
    source.register_bound_client(relay).expect("attach failed");
    let tags = source.context().tags().find_or_create("Bench|Relay");

    c.bench_function("BridgeRelay line", |b| {
        b.iter(|| {
            let line = LineData::new(Level::Info, black_box("relayed")).tags(tags.clone());
            source.log_with(line).expect("log failed");
        });
    });

    c.bench_function("BridgeRelay group", |b| {
        b.iter(|| {
            source.open_group(Level::Info, black_box("relayed")).expect("open failed");
            source.close_group().expect("close failed");
        });
    });
}

fn bench_wire_json(c: &mut Criterion) {
    let line = WireLine {
        tags: "Bench|Relay".to_string(),
        level: Level::Warn,
        filtered: true,
        text: "benchmark wire line".to_string(),
        exception: None,
        time: LogTime::now(),
        file: "benches/bridge.rs".to_string(),
        line: 1,
    };
    let json = line.to_json().expect("serialize failed");

    c.bench_function("WireLine::to_json", |b| {
        b.iter(|| black_box(&line).to_json().expect("serialize failed"));
    });

    c.bench_function("WireLine::from_json", |b| {
        b.iter(|| WireLine::from_json(black_box(&json)).expect("parse failed"));
    });
}

criterion_group!(benches, bench_relay_line, bench_wire_json);
criterion_main!(benches);
