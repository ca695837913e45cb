use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lazypipe::prelude::*;
use serde_json::{json, Value};

fn make_records(rows: usize) -> Vec<Value> {
    (0..rows)
        .map(|i| {
            json!({
                "id": i,
                "group": format!("group-{}", i % 4),
                "value": (i % 10) as f64,
            })
        })
        .collect()
}

fn bench_map_keep_reduce(c: &mut Criterion) {
    let records = make_records(1024);
    c.bench_function("map_keep_reduce", |b| {
        b.iter(|| {
            let total = Pipeline::new(records.clone())
                .map(|a| Ok(json!(a.value()["value"].as_f64().unwrap_or(0.0) * 2.0)))
                .keep(|a| Ok(a.value().as_f64().unwrap_or(0.0) > 4.0))
                .reduce(0.0, |acc, a| Ok(acc + a.value().as_f64().unwrap_or(0.0)))
                .unwrap();
            black_box(total);
        })
    });
}

fn bench_keyed_join(c: &mut Criterion) {
    let records = make_records(1024);
    let groups: Vec<(Key, Value)> = (0..4)
        .map(|g| (Key::from(format!("group-{}", g)), json!({"rank": g})))
        .collect();
    c.bench_function("keyed_join", |b| {
        b.iter(|| {
            let secondary = Pipeline::new(Sequence::from_entries(groups.clone())).label("groups");
            let n = Pipeline::new(records.clone())
                .label("records")
                .join(vec![("group", secondary)], JoinType::Inner)
                .count()
                .unwrap();
            black_box(n);
        })
    });
}

fn bench_project(c: &mut Criterion) {
    let records = make_records(1024);
    c.bench_function("project", |b| {
        b.iter(|| {
            let n = Pipeline::new(records.clone()).project("group").count().unwrap();
            black_box(n);
        })
    });
}

criterion_group!(benches, bench_map_keep_reduce, bench_keyed_join, bench_project);
criterion_main!(benches);
