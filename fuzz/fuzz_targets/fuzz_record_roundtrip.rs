//! Fuzz testing for record encoding.
//!
//! Sets arbitrary values on a fuzzer-chosen flat record type, encodes it, and
//! checks that every field reads back as what was set, or as the field's
//! absent value when the set value is null, of the wrong kind, or the default.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use rowpax::records::{Record, RecordView, WritableRecord};
use rowpax::{FieldDescriptor, FieldType, PrimitiveKind, RecordType, SortOrder, Value};

#[derive(Debug, Arbitrary)]
struct RoundtripInput {
    fields: Vec<FuzzField>,
    sort_key: Option<u8>,
    operations: Vec<SetOperation>,
}

#[derive(Debug, Arbitrary)]
struct FuzzField {
    kind: FuzzKind,
    list: bool,
    has_reference: bool,
    default: Option<FuzzValue>,
}

#[derive(Debug, Arbitrary, Clone, Copy)]
enum FuzzKind {
    Bool,
    Byte,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    String,
    Binary,
}

#[derive(Debug, Arbitrary, Clone)]
enum FuzzValue {
    Null,
    Bool(bool),
    Byte(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    List(Vec<FuzzValue>),
}

#[derive(Debug, Arbitrary)]
struct SetOperation {
    field: u8,
    value: FuzzValue,
}

impl From<FuzzKind> for PrimitiveKind {
    fn from(kind: FuzzKind) -> Self {
        match kind {
            FuzzKind::Bool => PrimitiveKind::Bool,
            FuzzKind::Byte => PrimitiveKind::Byte,
            FuzzKind::Int16 => PrimitiveKind::Int16,
            FuzzKind::Int32 => PrimitiveKind::Int32,
            FuzzKind::Int64 => PrimitiveKind::Int64,
            FuzzKind::Float => PrimitiveKind::Float,
            FuzzKind::Double => PrimitiveKind::Double,
            FuzzKind::String => PrimitiveKind::String,
            FuzzKind::Binary => PrimitiveKind::Binary,
        }
    }
}

impl From<FuzzValue> for Value {
    fn from(value: FuzzValue) -> Self {
        match value {
            FuzzValue::Null => Value::Null,
            FuzzValue::Bool(v) => Value::Bool(v),
            FuzzValue::Byte(v) => Value::Byte(v),
            FuzzValue::Int16(v) => Value::Int16(v),
            FuzzValue::Int32(v) => Value::Int32(v),
            FuzzValue::Int64(v) => Value::Int64(v),
            FuzzValue::Float(v) => Value::Float(v),
            FuzzValue::Double(v) => Value::Double(v),
            FuzzValue::String(mut v) => {
                while v.len() > 1024 {
                    v.pop();
                }
                Value::String(v)
            }
            FuzzValue::Binary(mut v) => {
                v.truncate(1024);
                Value::Binary(v)
            }
            FuzzValue::List(items) => Value::List(items.into_iter().take(64).map(Into::into).collect()),
        }
    }
}

fn build_type(input: &RoundtripInput) -> Option<std::sync::Arc<RecordType>> {
    let sort_key = input.sort_key.map(|k| k as usize % input.fields.len());
    let descriptors = input
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let scalar = FieldType::primitive(field.kind.into());
            let ty = if field.list && sort_key != Some(i) {
                FieldType::list(scalar)
            } else {
                scalar
            };
            let mut descriptor = FieldDescriptor::new(i as u16 + 1, format!("f{}", i), ty);
            if sort_key == Some(i) {
                descriptor = descriptor.required().sort_key(SortOrder::Ascending);
            } else if let Some(default) = &field.default {
                descriptor = descriptor.with_default(Value::from(default.clone()));
            }
            if field.has_reference {
                descriptor = descriptor.has_reference();
            }
            descriptor
        })
        .collect();
    RecordType::new("fuzzed", descriptors).ok()
}

fuzz_target!(|input: RoundtripInput| {
    if input.fields.is_empty() || input.fields.len() > 32 || input.operations.len() > 256 {
        return;
    }
    let Some(record_type) = build_type(&input) else {
        return;
    };
    let Ok(mut record) = WritableRecord::new(&record_type) else {
        return;
    };
    let codec = record.codec().clone();

    let mut expected: Vec<Value> = vec![Value::Null; record_type.field_count()];
    for op in &input.operations {
        let idx = op.field as usize % record_type.field_count();
        let value = Value::from(op.value.clone());
        if record.set_value(idx as u16 + 1, value.clone()).is_ok() {
            expected[idx] = value;
        }
    }

    let predicted = record.encoded_len();
    let Ok(bytes) = record.to_bytes() else {
        return;
    };
    assert_eq!(bytes.len(), predicted);

    let decoded = codec.decode(&bytes).expect("freshly encoded record must decode");
    let view = RecordView::with_codec(codec.clone(), &bytes).expect("header must be valid");
    let mut reread = WritableRecord::from_buffer(codec.clone(), bytes.clone()).expect("header");

    for (idx, value) in expected.iter().enumerate() {
        let id = idx as u16 + 1;
        let want = if codec.is_present(idx, value) {
            value.clone()
        } else {
            record_type.fields()[idx].absent_value()
        };
        assert_eq!(decoded[idx], want, "full decode of field {}", id);
        assert_eq!(view.get_value(id).unwrap(), want, "view of field {}", id);
        assert_eq!(reread.get_value(id).unwrap(), want, "record field {}", id);
    }
});
