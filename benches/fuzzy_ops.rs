//! Criterion benchmarks for the hot fuzzy operators and whole-model evaluation.
//!
//! Run with: `cargo bench --bench fuzzy_ops`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use eems_fuzzy_rust::fuzzy::{CvtToFuzzy, FuzzySelectedUnion, FuzzyXOr};
use eems_fuzzy_rust::{
    Command, CommandSource, DataType, EvaluationNode, ExecutedNode, FuzzyRange, Grid, Model,
    Operator, Registry, ResultContext,
};

const SIZES: [usize; 2] = [100, 500];

/// Deterministic pseudo-random grid in [lo, hi] with roughly 5% nodata
fn grid(side: usize, seed: usize, lo: f64, hi: f64) -> Grid {
    let n = side * side;
    let values = (0..n)
        .map(|i| lo + (hi - lo) * (((i * 7919 + seed * 104_729) % 1000) as f64 / 999.0))
        .collect();
    let mask = (0..n).map(|i| (i + seed) % 20 == 0).collect();
    Grid::with_mask(side, side, values, mask).unwrap()
}

fn context(side: usize, fuzzy_layers: usize) -> ResultContext {
    let ctx = ResultContext::new(FuzzyRange::default());
    ctx.insert(
        ExecutedNode::layer("Raw", grid(side, 0, 0.0, 100.0), DataType::Float),
        &CommandSource::default(),
    )
    .unwrap();
    for k in 0..fuzzy_layers {
        ctx.insert(
            ExecutedNode::layer(&format!("F{}", k), grid(side, k + 1, -1.0, 1.0), DataType::Fuzzy),
            &CommandSource::default(),
        )
        .unwrap();
    }
    ctx
}

fn fuzzy_names(n: usize) -> Vec<String> {
    (0..n).map(|k| format!("F{}", k)).collect()
}

fn bench_cvt_to_fuzzy(c: &mut Criterion) {
    let mut group = c.benchmark_group("cvt_to_fuzzy");
    for side in SIZES {
        let ctx = context(side, 0);
        let node = CvtToFuzzy::from_command(
            Command::new("Fz", "CvtToFuzzy")
                .arg("InFieldName", "Raw")
                .arg("Direction", "LowToHigh"),
        )
        .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, _| {
            b.iter(|| node.compute(&ctx).unwrap());
        });
    }
    group.finish();
}

fn bench_stacked_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("stacked");
    for side in SIZES {
        let ctx = context(side, 6);
        let names = fuzzy_names(6);

        let selected = FuzzySelectedUnion::from_command(
            Command::new("Sel", "FuzzySelectedUnion")
                .arg("InFieldNames", names.iter().map(String::as_str).collect::<Vec<_>>())
                .arg("TruestOrFalsest", "Truest")
                .arg("NumberToConsider", 3_i64),
        )
        .unwrap();
        let xor = FuzzyXOr::from_command(
            Command::new("X", "FuzzyXOr")
                .arg("InFieldNames", names.iter().map(String::as_str).collect::<Vec<_>>()),
        )
        .unwrap();

        group.bench_with_input(BenchmarkId::new("selected_union", side), &side, |b, _| {
            b.iter(|| selected.compute(&ctx).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("xor", side), &side, |b, _| {
            b.iter(|| xor.compute(&ctx).unwrap());
        });
    }
    group.finish();
}

/// Eight independent conversions feeding one union: a wide first level
fn wide_model(side: usize) -> Model {
    let mut commands = Vec::new();
    for k in 0..8 {
        commands.push(
            Command::new(&format!("Fz{}", k), "CvtToFuzzy")
                .arg("InFieldName", format!("In{}", k).as_str())
                .arg("Direction", if k % 2 == 0 { "LowToHigh" } else { "HighToLow" }),
        );
    }
    let fz: Vec<String> = (0..8).map(|k| format!("Fz{}", k)).collect();
    commands.push(
        Command::new("Union", "FuzzyUnion")
            .arg("InFieldNames", fz.iter().map(String::as_str).collect::<Vec<_>>()),
    );

    let mut model = Model::from_commands(&Registry::standard(), commands).unwrap();
    for k in 0..8 {
        model.add_input(ExecutedNode::layer(
            &format!("In{}", k),
            grid(side, k, 0.0, 50.0),
            DataType::Float,
        ));
    }
    model
}

fn bench_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("model");
    group.sample_size(20);
    for side in SIZES {
        let model = wide_model(side);
        for parallel in [false, true] {
            let label = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(label, side), &side, |b, _| {
                b.iter(|| {
                    let ctx = ResultContext::new(FuzzyRange::default());
                    model.evaluate(&ctx, parallel).unwrap()
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_cvt_to_fuzzy, bench_stacked_ops, bench_model);
criterion_main!(benches);
