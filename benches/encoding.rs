//! PAX encoding benchmarks for rowpax
//!
//! Measures column statistics, scheme selection and full batch encode and
//! decode over columns shaped to favour each scheme.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box as hint_black_box;
use std::sync::Arc;
use rowpax::pax::schemes::select;
use rowpax::pax::{CompressStats, PaxEncoder, PaxView};
use rowpax::records::{Record, WritableRecord};
use rowpax::{
    CodecOptions, CodecRegistry, FieldDescriptor, FieldType, PrimitiveKind, RecordType, Value,
};

const ROWS: usize = 4096;

fn event_type() -> Arc<RecordType> {
    RecordType::new(
        "event",
        vec![
            FieldDescriptor::new(1, "kind", FieldType::primitive(PrimitiveKind::String)),
            FieldDescriptor::new(2, "ts", FieldType::primitive(PrimitiveKind::Int64)),
            FieldDescriptor::new(3, "shard", FieldType::primitive(PrimitiveKind::Int16)),
            FieldDescriptor::new(4, "status", FieldType::primitive(PrimitiveKind::Int32)),
            FieldDescriptor::new(5, "latency", FieldType::primitive(PrimitiveKind::Float)),
        ],
    )
    .unwrap()
}

fn columns() -> Vec<(&'static str, Vec<Value>)> {
    let kinds = ["click", "view", "scroll", "purchase", "login", "logout"];
    vec![
        (
            "dictionary",
            (0..ROWS).map(|i| Value::from(kinds[i % kinds.len()])).collect(),
        ),
        ("plain", (0..ROWS).map(|i| Value::Int64(i as i64 * 31)).collect()),
        ("run_length", (0..ROWS).map(|i| Value::Int16((i / 512) as i16)).collect()),
        (
            "common_value",
            (0..ROWS)
                .map(|i| Value::Int32(if i % 97 == 0 { 500 } else { 200 }))
                .collect(),
        ),
    ]
}

fn events(t: &Arc<RecordType>) -> Vec<WritableRecord> {
    let columns = columns();
    (0..ROWS)
        .map(|row| {
            let mut record = WritableRecord::new(t).unwrap();
            for (idx, (_, column)) in columns.iter().enumerate() {
                record.set_value(idx as u16 + 1, column[row].clone()).unwrap();
            }
            record
                .set_value(5, Value::Float(row as f32 * 0.1))
                .unwrap();
            record
        })
        .collect()
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheme_selection");
    let t = event_type();
    let codec = CodecRegistry::global().codec_for(&t).unwrap();

    for (idx, (name, column)) in columns().into_iter().enumerate() {
        let op = codec.operator(idx).unwrap();
        group.bench_with_input(BenchmarkId::new("stats_and_select", name), &column, |b, column| {
            b.iter(|| {
                let stats = CompressStats::new(op, CodecOptions::default(), black_box(column));
                hint_black_box(select(&stats))
            });
        });
    }

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("pax_batch");
    let t = event_type();
    let encoder = PaxEncoder::new(&t).unwrap();
    let mut records = events(&t);
    let bytes = encoder.encode(&mut records).unwrap();

    group.bench_function("encode", |b| {
        b.iter(|| hint_black_box(encoder.encode(black_box(&mut records)).unwrap()));
    });

    group.bench_function("decode_column", |b| {
        let view = PaxView::new(&t, &bytes).unwrap();
        b.iter(|| hint_black_box(view.decode_column(black_box(1)).unwrap()));
    });

    group.bench_function("decode_records", |b| {
        b.iter(|| {
            let view = PaxView::new(&t, black_box(&bytes)).unwrap();
            hint_black_box(view.records().unwrap())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_selection, bench_batch);
criterion_main!(benches);
