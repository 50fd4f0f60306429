use cron2ical::expand::{expand, DayWindow};
use cron2ical::Cron;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

const INPUTS: [&str; 4] = [
    "* * * * *",
    "1 12 3 6 *",
    "12-35 1-23 2-5 1-11 *",
    "*/10 9-17 15W * MON-FRI",
];

fn parse_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Cron.from_str");
    for input in INPUTS.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(input), input, |b, input| {
            b.iter(|| input.parse::<Cron>().unwrap())
        });
    }
    group.finish()
}

fn expand_benchmark(c: &mut Criterion) {
    let window: DayWindow = "02-09-2024".parse().unwrap();
    let mut group = c.benchmark_group("expand");
    for input in INPUTS.iter() {
        let cron: Cron = input.parse().unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(input), &cron, |b, cron| {
            b.iter(|| expand(cron, "job", &window).count())
        });
    }
    group.finish()
}

criterion_group!(benches, parse_benchmark, expand_benchmark);
criterion_main!(benches);
