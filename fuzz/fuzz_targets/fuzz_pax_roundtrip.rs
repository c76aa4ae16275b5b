//! Fuzz testing for PAX batches.
//!
//! Builds a batch from fuzzer-chosen column contents, encodes it and checks
//! that every column decodes back to the values the records held. Small
//! value alphabets push the selector towards run-length, dictionary and
//! common-value encodings.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use rowpax::pax::{PaxEncoder, PaxView};
use rowpax::records::{Record, WritableRecord};
use rowpax::{FieldDescriptor, FieldType, PrimitiveKind, RecordType, Value};

#[derive(Debug, Arbitrary)]
struct PaxInput {
    rows: Vec<Row>,
}

#[derive(Debug, Arbitrary)]
struct Row {
    small: Option<u8>,
    wide: i64,
    label: Option<u8>,
    ratio: f32,
}

fn batch_type() -> std::sync::Arc<RecordType> {
    RecordType::new(
        "fuzz_batch",
        vec![
            FieldDescriptor::new(1, "small", FieldType::primitive(PrimitiveKind::Int32)),
            FieldDescriptor::new(2, "wide", FieldType::primitive(PrimitiveKind::Int64)),
            FieldDescriptor::new(3, "label", FieldType::primitive(PrimitiveKind::String))
                .with_default("none"),
            FieldDescriptor::new(4, "ratio", FieldType::primitive(PrimitiveKind::Float)),
        ],
    )
    .expect("static record type is valid")
}

fuzz_target!(|input: PaxInput| {
    if input.rows.len() > 2048 {
        return;
    }
    let record_type = batch_type();

    let mut records: Vec<WritableRecord> = input
        .rows
        .iter()
        .map(|row| {
            let mut record = WritableRecord::new(&record_type).unwrap();
            record
                .set_value(1, row.small.map(|v| Value::Int32((v % 4) as i32)).into())
                .unwrap();
            record.set_value(2, Value::Int64(row.wide)).unwrap();
            record
                .set_value(3, row.label.map(|v| format!("label-{}", v % 8)).into())
                .unwrap();
            record.set_value(4, Value::Float(row.ratio)).unwrap();
            record
        })
        .collect();

    let bytes = PaxEncoder::new(&record_type)
        .unwrap()
        .encode(&mut records)
        .expect("valid batch must encode");
    let view = PaxView::new(&record_type, &bytes).expect("encoded batch must parse");
    assert_eq!(view.num_records(), records.len());

    for id in 1..=4u16 {
        let column = view.decode_column(id).expect("column must decode");
        for (record, value) in records.iter_mut().zip(column) {
            assert_eq!(record.get_value(id).unwrap(), value, "column {}", id);
        }
    }
});
