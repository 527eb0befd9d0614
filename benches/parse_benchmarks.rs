use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use resmon::metrics::{
    data::{NetworkRate, ProviderReading},
    parse,
    rate::compute_rate,
};
use resmon::{InterfaceCounters, MetricSample};
use std::time::Duration;
use tokio::time::Instant;

const TOP_OUTPUT: &str = "\
top - 10:01:02 up 3 days,  2:11,  1 user,  load average: 0.08, 0.03, 0.01
Tasks: 112 total,   1 running, 111 sleeping,   0 stopped,   0 zombie
%Cpu(s):  2.0 us,  1.0 sy,  0.0 ni, 96.9 id,  0.0 wa,  0.0 hi,  0.1 si,  0.0 st
";

const VMSTAT_OUTPUT: &str = "\
procs -----------memory---------- ---swap-- -----io---- -system-- ------cpu-----
 r  b   swpd   free   buff  cache   si   so    bi    bo   in   cs us sy id wa st
 0  0      0 1979852  59348 1438284    0    0     3     5   41   63  1  0 99  0  0
 1  0      0 1979600  59348 1438284    0    0     0     0  212  301  3  1 95  1  0
";

/// Build a /proc/net/dev table with `count` interfaces
fn proc_net_dev(count: usize) -> String {
    let mut table = String::from(
        "Inter-|   Receive                                                |  Transmit\n \
         face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n",
    );
    for i in 0..count {
        table.push_str(&format!(
            "  eth{i}: {} 65432 0 0 0 0 0 120 {} 43210 0 0 0 0 0 0\n",
            98_765_432 + i,
            12_345_678 + i
        ));
    }
    table
}

/// Benchmark CPU backend parsers
fn bench_cpu_parsers(c: &mut Criterion) {
    c.bench_function("parse_top_idle", |b| {
        b.iter(|| parse::parse_top_idle(black_box(TOP_OUTPUT)).expect("Should parse top"))
    });

    c.bench_function("parse_vmstat_idle", |b| {
        b.iter(|| parse::parse_vmstat_idle(black_box(VMSTAT_OUTPUT)).expect("Should parse vmstat"))
    });
}

/// Benchmark /proc/net/dev parsing as the interface count grows
fn bench_proc_net_dev(c: &mut Criterion) {
    for count in [2, 16, 128].iter() {
        let table = proc_net_dev(*count);
        c.bench_with_input(BenchmarkId::new("parse_proc_net_dev", count), &table, |b, table| {
            b.iter(|| parse::parse_proc_net_dev(black_box(table)))
        });
    }
}

/// Benchmark rate computation and line formatting for one tick
fn bench_tick_output(c: &mut Criterion) {
    let start = Instant::now();
    let previous = InterfaceCounters::observed("eth0", 1_000_000, 500_000, start);
    let current =
        InterfaceCounters::observed("eth0", 3_000_000, 900_000, start + Duration::from_secs(2));

    c.bench_function("compute_rate", |b| {
        b.iter(|| compute_rate(black_box(&previous), black_box(&current)))
    });

    let reading = ProviderReading {
        cpu_percent: 17,
        memory_percent: 48.2,
        disk_percent: 63,
        counters: None,
    };
    let rate = NetworkRate {
        receive_kbps: 976.6,
        transmit_kbps: 195.3,
    };
    let sample = MetricSample::from_reading(chrono::Local::now(), &reading, rate, "/", "eth0");

    c.bench_function("format_sample_line", |b| b.iter(|| black_box(&sample).to_string()));
}

criterion_group!(
    benches,
    bench_cpu_parsers,
    bench_proc_net_dev,
    bench_tick_output
);
criterion_main!(benches);
