use chrono::NaiveDate;
use costing_calc::{CostingCalculator, PricingSheet};
use costing_core::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;

fn registry() -> InMemoryPriceRegistry {
    let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default();
    let mut registry = InMemoryPriceRegistry::new();
    for i in 0..50 {
        registry
            .record(
                &format!("YARN-{}", i),
                YarnRole::Both,
                None,
                Some(Decimal::from(50 + i)),
                Decimal::from(200 + i),
                date,
            )
            .unwrap();
    }
    registry
}

fn recipe(segment_count: i64) -> Recipe {
    let segments = (0..segment_count)
        .map(|i| {
            WeftSegment::with_denier(Decimal::from(8 + i), Decimal::from(60 + i), Decimal::from(210))
                .linked_to(format!("YARN-{}", i % 50))
        })
        .collect();
    Recipe::new(
        format!("BENCH-{}", segment_count),
        Decimal::new(455, 1),
        WarpSpec::direct(Decimal::from(3000), Decimal::from(120), Decimal::from(450)).linked_to("YARN-0"),
        WeftSpec::segments(segments),
        CostingConfig::new(Decimal::new(16, 2))
            .with_grey_markup(Decimal::from(10))
            .with_rfd_charge(Decimal::from(8))
            .with_rfd_shortage_percent(Decimal::from(5))
            .with_rfd_markup(Decimal::from(12)),
    )
}

fn bench_recompute(c: &mut Criterion) {
    let calculator = CostingCalculator::new(registry());
    let mut group = c.benchmark_group("recompute");
    for segments in [1, 4, 16] {
        let recipe = recipe(segments);
        group.bench_with_input(BenchmarkId::new("effective", segments), &recipe, |b, r| {
            b.iter(|| calculator.recompute(black_box(r)))
        });
        group.bench_with_input(BenchmarkId::new("per_segment", segments), &recipe, |b, r| {
            b.iter(|| calculator.multi_weft_breakdown(black_box(r)))
        });
    }
    group.finish();
}

fn bench_pricing_sheet(c: &mut Criterion) {
    let calculator = CostingCalculator::new(registry());
    let recipes: Vec<Recipe> = (1..=200).map(|i| recipe(i % 6 + 1)).collect();
    c.bench_function("pricing_sheet_200", |b| {
        b.iter(|| PricingSheet::from_recipes(&calculator, black_box(&recipes)))
    });
}

criterion_group!(benches, bench_recompute, bench_pricing_sheet);
criterion_main!(benches);
