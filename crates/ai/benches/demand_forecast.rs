use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::{Duration, Utc};
use stockroom_ai::{DemandHistory, MovementSample, ReorderInput, predict_demand, recommend_reorder};

/// 90 days of history, newest first, roughly two thirds outbound.
fn history(points: usize) -> DemandHistory {
    let now = Utc::now();
    let samples = (0..points)
        .map(|i| MovementSample {
            outbound: i % 3 != 0,
            quantity: 5 + (i as i64 * 7) % 23,
            occurred_at: now - Duration::minutes(i as i64 * 90),
        })
        .collect();
    DemandHistory::new(samples)
}

fn bench_predict_demand(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict_demand");
    for points in [10usize, 100, 1_000, 10_000] {
        let h = history(points);
        group.throughput(Throughput::Elements(points as u64));
        group.bench_with_input(BenchmarkId::from_parameter(points), &h, |b, h| {
            b.iter(|| predict_demand(black_box(h.clone()), 30))
        });
    }
    group.finish();
}

fn bench_reorder(c: &mut Criterion) {
    let forecast = predict_demand(history(500), 30);
    c.bench_function("recommend_reorder", |b| {
        b.iter(|| {
            recommend_reorder(black_box(ReorderInput {
                product_name: "Bench Widget".into(),
                quantity: 42,
                reserved_quantity: 5,
                reorder_level: 50,
                max_stock_level: 400,
                predicted_demand_30_days: forecast.predicted_demand,
            }))
        })
    });
}

criterion_group!(benches, bench_predict_demand, bench_reorder);
criterion_main!(benches);
