use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use impliedvol_rs::prelude::*;
use std::hint::black_box;

fn reference_market() -> MarketParams {
    MarketParams::new(105.0, 105.0, 30.0 / 365.0, 0.01)
}

fn bench_pricing(c: &mut Criterion) {
    let params = reference_market();
    let mut group = c.benchmark_group("price_call");

    for (name, model, vol) in [
        ("log_normal", PricingModel::LogNormal, 0.30),
        ("arithmetic", PricingModel::Arithmetic, 31.5),
    ] {
        let engine = PricingEngine::new(model, OptionType::Call);
        group.bench_function(name, |b| {
            b.iter(|| black_box(engine.price(black_box(&params), black_box(vol))))
        });
    }

    group.finish();
}

fn bench_scalar_solve(c: &mut Criterion) {
    let params = reference_market();
    let mut group = c.benchmark_group("solve_scalar");

    for (name, model, vol, guess) in [
        ("log_normal", PricingModel::LogNormal, 0.30, 0.2),
        ("arithmetic", PricingModel::Arithmetic, 31.5, 20.0),
    ] {
        let calculator = ImpliedVolatility::new(model, OptionType::Call, SolverConfig::default());
        let quote = calculator.engine().price(&params, vol);
        group.bench_function(name, |b| {
            b.iter(|| {
                calculator
                    .solve(black_box(&params), black_box(quote), black_box(guess))
                    .map(|result| black_box(result.iv))
            })
        });
    }

    group.finish();
}

fn bench_batch_solve(c: &mut Criterion) {
    let calculator = ImpliedVolatility::new(
        PricingModel::LogNormal,
        OptionType::Put,
        SolverConfig::new().with_tolerance(1e-8),
    );
    let mut group = c.benchmark_group("solve_batch");

    for size in [16_usize, 256, 4096] {
        let strikes: Vec<f64> = (0..size)
            .map(|i| 80.0 + 40.0 * i as f64 / size as f64)
            .collect();
        let batch = MarketBatch::from_columns(&[100.0], &strikes, &[0.5], &[0.02])
            .expect("benchmark batch should be valid");
        let vols = vec![0.25; size];
        let quotes = calculator
            .engine()
            .price_batch(&batch, &vols)
            .expect("benchmark quotes should price");

        group.bench_with_input(BenchmarkId::new("lockstep", size), &size, |b, _| {
            b.iter(|| {
                calculator
                    .solve_batch(black_box(&batch), black_box(&quotes), vec![0.4; size])
                    .map(|result| black_box(result.iterations))
            })
        });

        let problems: Vec<(MarketParams, f64)> =
            batch.iter().copied().zip(quotes.iter().copied()).collect();
        group.bench_with_input(BenchmarkId::new("independent", size), &size, |b, _| {
            b.iter(|| black_box(calculator.solve_many(black_box(&problems), Some(0.4))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pricing, bench_scalar_solve, bench_batch_solve);
criterion_main!(benches);
