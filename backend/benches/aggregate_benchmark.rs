use chrono::{Duration, NaiveDate};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;
use std::hint::black_box;

use ops_reporting::cache::cache_key;
use ops_reporting::models::{AggregatedRow, FilterSet, GroupingLevel, TimeWindow};
use ops_reporting::services::{merge_rows, split};

const DEPARTMENTS: [&str; 6] = ["ICU", "SURG", "ER", "PED", "CARD", "ONC"];
const ITEM_CLASSES: [&str; 4] = ["beds", "drugs", "labs", "imaging"];

fn rows(days: i64, per_day: usize) -> Vec<AggregatedRow> {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    (0..days)
        .flat_map(|offset| {
            let date = start + Duration::days(offset);
            (0..per_day).map(move |i| {
                let dept = DEPARTMENTS[i % DEPARTMENTS.len()];
                AggregatedRow::new(date, dept, dept, Decimal::from(i as i64 + 1), Decimal::ONE)
                    .with_doctor(format!("D{:03}", i % 40), "Doctor")
                    .with_item_class(ITEM_CLASSES[i % ITEM_CLASSES.len()])
            })
        })
        .collect()
}

fn bench_merge_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_rows");

    for (days, per_day) in [(30, 200), (365, 200)] {
        let input = rows(days, per_day);
        for level in [GroupingLevel::Department, GroupingLevel::ItemClass, GroupingLevel::Doctor] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", level), input.len()),
                &input,
                |b, input| b.iter(|| merge_rows(black_box(input.clone()), level)),
            );
        }
    }

    group.finish();
}

fn bench_split_and_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_overhead");
    let window = TimeWindow::new(
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
    )
    .unwrap();
    let cutover = NaiveDate::from_ymd_opt(2025, 11, 10).unwrap();
    let filters = FilterSet::all().with_departments(DEPARTMENTS);

    group.bench_function("split", |b| b.iter(|| split(black_box(&window), cutover)));
    group.bench_function("cache_key", |b| {
        b.iter(|| cache_key(&["compare", "revenue"], black_box(&window), black_box(&filters)))
    });

    group.finish();
}

criterion_group!(benches, bench_merge_rows, bench_split_and_key);
criterion_main!(benches);
