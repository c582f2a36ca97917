use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use story_core::{DerivedSubsets, FilterState, OccupationLevel, Percentiles, Record, Selection};

fn synthetic_records(titles: usize) -> Vec<Record> {
    let mut records = Vec::with_capacity(titles * 10);
    for year in 2014..2024 {
        for index in 0..titles {
            let level = if index % 5 == 0 {
                OccupationLevel::Major
            } else {
                OccupationLevel::Minor
            };
            let median =
                30_000.0 + (index as f64 * 731.0) % 90_000.0 + (year - 2014) as f64 * 900.0;
            if let Some(record) = Record::new(
                format!("Occupation {index}"),
                level,
                (index % 23) as i32 + 11,
                year,
                median * 1.1,
                Some(1_000 + index as u64 * 37),
                Percentiles::new(median * 0.5, median * 0.7, median, median * 1.3, median * 1.8),
            ) {
                records.push(record);
            }
        }
    }
    records
}

fn bench_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_recompute");

    for titles in [50usize, 200, 800] {
        let records = synthetic_records(titles);
        let aggregate = FilterState {
            year: Selection::Only(2020),
            level: Selection::Only(OccupationLevel::Minor),
            title: Selection::All,
        };
        let single = FilterState {
            title: Selection::Only("Occupation 7".to_string()),
            ..aggregate.clone()
        };

        group.bench_with_input(BenchmarkId::new("aggregate", titles), &records, |b, records| {
            b.iter(|| DerivedSubsets::compute(records, &aggregate))
        });
        group.bench_with_input(BenchmarkId::new("single_title", titles), &records, |b, records| {
            b.iter(|| DerivedSubsets::compute(records, &single))
        });
    }

    group.finish();
}

criterion_group!(filter_benches, bench_recompute);
criterion_main!(filter_benches);
