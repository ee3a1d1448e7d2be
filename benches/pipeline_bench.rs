use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::{hint::black_box, io::Cursor, time::Duration};
use warppipe::{Pipeline, StageOptions, StageRegistry, StageSpec};

const LINES: &[&str] = &[
    "“Hello,” she said… (quietly) and left at 5 p.m.",
    "Mr. Smith isn't here; he's in the well-known state-of-the-art lab.",
    "Prices rose 3,5 % in «Paris» — again!",
    "你好，世界。这是一个测试！",
    "<b>Markup</b> & [brackets] | \"quotes\" 'single'",
];

fn corpus(lines: usize) -> Vec<u8> {
    LINES
        .iter()
        .cycle()
        .take(lines)
        .flat_map(|l| l.bytes().chain(std::iter::once(b'\n')))
        .collect()
}

fn run(registry: &StageRegistry, stages: &[&str], jobs: usize, input: &[u8]) -> usize {
    let pipeline = Pipeline::builder(registry)
        .defaults(StageOptions::new().jobs(jobs).quiet(true))
        .add_stages(stages.iter().map(|s| StageSpec::new(*s)))
        .build()
        .unwrap();
    let mut out = Vec::with_capacity(input.len() * 2);
    pipeline.run(Cursor::new(input), &mut out).unwrap();
    out.len()
}

fn pipeline_matrix(c: &mut Criterion) {
    let registry = StageRegistry::builtin();

    for &size in &[1_000usize, 20_000] {
        let input = corpus(size);
        let mut group = c.benchmark_group(format!("normalize+tokenize/{size}"));
        group.throughput(Throughput::Elements(size as u64));

        for jobs in [1usize, 4] {
            group.bench_with_input(BenchmarkId::new("jobs", jobs), &input, |b, input| {
                b.iter(|| black_box(run(&registry, &["normalize", "tokenize"], jobs, input)))
            });
        }
        group.finish();
    }

    let input = corpus(10_000);
    c.bench_function("echo/10000", |b| {
        b.iter(|| black_box(run(&registry, &[], 1, &input)))
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(3))
        .warm_up_time(Duration::from_secs(1))
        .sample_size(20);
    targets = pipeline_matrix
);
criterion_main!(benches);
