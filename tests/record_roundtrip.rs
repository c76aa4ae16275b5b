//! # Record Round-Trip Tests
//!
//! End-to-end checks of the row format through the public API:
//!
//! - every field reads back the same through full decode, fast paths and views
//! - unset and default-valued fields decode to their default
//! - list sizes are available without materialising the list
//! - oversized strings follow the configured policy

use std::sync::Arc;

use rowpax::records::{Record, RecordView, WritableRecord};
use rowpax::{
    CodecError, CodecOptions, CodecRegistry, FieldDescriptor, FieldType, OversizedStringPolicy,
    PrimitiveKind, RecordType, SortOrder, Value,
};

fn prim(kind: PrimitiveKind) -> FieldType {
    FieldType::primitive(kind)
}

fn player() -> Arc<RecordType> {
    RecordType::new(
        "player",
        vec![
            FieldDescriptor::new(1, "id", prim(PrimitiveKind::Int64))
                .required()
                .has_reference(),
            FieldDescriptor::new(2, "score", prim(PrimitiveKind::Int32))
                .required()
                .sort_key(SortOrder::Descending),
            FieldDescriptor::new(3, "team", prim(PrimitiveKind::String)).with_default("Unknown"),
        ],
    )
    .unwrap()
}

fn inventory() -> Arc<RecordType> {
    let slot = RecordType::new(
        "slot",
        vec![
            FieldDescriptor::new(1, "item", prim(PrimitiveKind::String)).required(),
            FieldDescriptor::new(2, "count", prim(PrimitiveKind::Int16)).with_default(1i16),
        ],
    )
    .unwrap();
    let stats = RecordType::new(
        "stats",
        vec![
            FieldDescriptor::new(1, "hp", prim(PrimitiveKind::Int32)),
            FieldDescriptor::new(2, "speed", prim(PrimitiveKind::Double)),
            FieldDescriptor::new(3, "buffs", FieldType::list(prim(PrimitiveKind::String))),
        ],
    )
    .unwrap();

    RecordType::new(
        "inventory",
        vec![
            FieldDescriptor::new(1, "owner", prim(PrimitiveKind::Int64))
                .required()
                .sort_key(SortOrder::Ascending),
            FieldDescriptor::new(2, "slots", FieldType::list(FieldType::group(slot))),
            FieldDescriptor::new(3, "stats", FieldType::group(stats)).has_reference(),
            FieldDescriptor::new(4, "gold", prim(PrimitiveKind::Int64)).with_default(0i64),
            FieldDescriptor::new(5, "icon", prim(PrimitiveKind::Binary)),
            FieldDescriptor::new(6, "ids", FieldType::list(prim(PrimitiveKind::Int32)))
                .large_list(),
            FieldDescriptor::derived("slot_count", prim(PrimitiveKind::Int32)),
        ],
    )
    .unwrap()
}

fn full_inventory() -> Vec<Value> {
    vec![
        Value::Int64(77),
        Value::List(vec![
            Value::Group(vec![Value::from("sword"), Value::Int16(1)]),
            Value::Group(vec![Value::from("potion"), Value::Int16(12)]),
            Value::Group(vec![Value::from("map"), Value::Null]),
        ]),
        Value::Group(vec![
            Value::Int32(120),
            Value::Double(1.5),
            Value::List(vec![Value::from("haste"), Value::from("shield")]),
        ]),
        Value::Int64(350),
        Value::Binary(vec![1, 2, 3, 4, 5]),
        Value::List((0..40).map(Value::Int32).collect()),
    ]
}

/// What a full decode returns for `full_inventory`: absent nested defaults
/// are filled in.
fn decoded_inventory() -> Vec<Value> {
    let mut values = full_inventory();
    values[1] = Value::List(vec![
        Value::Group(vec![Value::from("sword"), Value::Int16(1)]),
        Value::Group(vec![Value::from("potion"), Value::Int16(12)]),
        Value::Group(vec![Value::from("map"), Value::Int16(1)]),
    ]);
    values
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn build(t: &Arc<RecordType>, values: &[Value]) -> WritableRecord {
    let mut record = WritableRecord::new(t).unwrap();
    for (idx, value) in values.iter().enumerate() {
        record.set_value(idx as u16 + 1, value.clone()).unwrap();
    }
    record
}

#[test]
fn scenario_from_three_field_table() {
    let t = player();
    let mut record = WritableRecord::new(&t).unwrap();
    record.set_value(1, Value::Int64(10)).unwrap();
    record.set_value(2, Value::Int32(99)).unwrap();
    let bytes = record.to_bytes().unwrap();

    let mut reread = WritableRecord::from_bytes(&t, bytes.clone()).unwrap();
    assert_eq!(reread.get_value(3).unwrap(), Value::from("Unknown"));
    assert_eq!(reread.get_value(1).unwrap(), Value::Int64(10));

    let codec = CodecRegistry::global().codec_for(&t).unwrap();
    assert_eq!(
        codec.decode(&bytes).unwrap(),
        vec![Value::Int64(10), Value::Int32(99), Value::from("Unknown")]
    );
}

#[test]
fn nested_roundtrip_agrees_across_access_paths() {
    let t = inventory();
    let expected = decoded_inventory();
    let mut record = build(&t, &full_inventory());
    let bytes = record.to_bytes().unwrap();

    let codec = CodecRegistry::global().codec_for(&t).unwrap();
    assert_eq!(codec.decode(&bytes).unwrap(), expected);

    let view = RecordView::new(&t, &bytes).unwrap();
    for id in 1..=6u16 {
        let mut fresh = WritableRecord::from_bytes(&t, bytes.clone()).unwrap();
        let via_record = fresh.get_value(id).unwrap();
        let via_view = view.get_value(id).unwrap();
        assert_eq!(via_record, expected[id as usize - 1], "record field {}", id);
        assert_eq!(via_view, expected[id as usize - 1], "view field {}", id);
    }
}

#[test]
fn list_sizes_without_materialising() {
    let t = inventory();
    let bytes = build(&t, &full_inventory()).into_bytes().unwrap();

    let mut record = WritableRecord::from_bytes(&t, bytes.clone()).unwrap();
    assert_eq!(record.list_size(2).unwrap(), 3);
    assert_eq!(record.list_size(6).unwrap(), 40);
    assert!(record.is_encoded());

    let decoded = RecordView::new(&t, &bytes).unwrap().values().unwrap();
    assert_eq!(decoded[1].as_list().unwrap().len(), 3);
    assert_eq!(decoded[5].as_list().unwrap().len(), 40);
}

#[test]
fn derived_fields_are_not_persisted() {
    let t = inventory();
    assert_eq!(t.field_count(), 6);
    let mut record = WritableRecord::new(&t).unwrap();
    assert!(record.set_value(7, Value::Int32(3)).is_err());
    assert!(record.get_value(0).is_err());
}

#[test]
fn unset_record_is_all_absent() {
    let t = inventory();
    let mut record = WritableRecord::new(&t).unwrap();
    let bytes = record.to_bytes().unwrap();
    let codec = record.codec().clone();
    assert_eq!(bytes.len(), codec.header_len());

    let values = codec.decode(&bytes).unwrap();
    assert_eq!(values[0], Value::Null);
    assert_eq!(values[3], Value::Int64(0));
    assert_eq!(record.list_size(2).unwrap(), 0);
}

#[test]
fn view_denies_writes_and_copies_on_request() {
    let t = player();
    let mut record = WritableRecord::new(&t).unwrap();
    record.set_value(1, Value::Int64(1)).unwrap();
    record.set_value(2, Value::Int32(2)).unwrap();

    let mut view = record.as_view().unwrap();
    let err = view.set_value(3, Value::from("red")).unwrap_err();
    assert!(matches!(
        CodecError::of(&err),
        Some(CodecError::AccessDenied { .. })
    ));

    let mut owned = view.to_owned_record().unwrap();
    owned.set_value(3, Value::from("red")).unwrap();
    assert_eq!(owned.get_value(3).unwrap(), Value::from("red"));
}

#[test]
fn oversized_string_is_rejected_by_default() {
    let t = player();
    let mut record = WritableRecord::new(&t).unwrap();
    record.set_value(1, Value::Int64(1)).unwrap();
    record.set_value(2, Value::Int32(1)).unwrap();
    record
        .set_value(3, Value::String("x".repeat(32768)))
        .unwrap();

    let err = record.to_bytes().unwrap_err();
    assert!(matches!(
        CodecError::of(&err),
        Some(CodecError::StringTooLong {
            len: 32768,
            max: 32767
        })
    ));
}

#[test]
fn oversized_string_can_be_written_empty() {
    init_tracing();
    let t = player();
    let registry = CodecRegistry::with_options(
        CodecOptions::default().oversized_strings(OversizedStringPolicy::WriteEmpty),
    );
    let mut record = WritableRecord::with_codec(registry.codec_for(&t).unwrap());
    record.set_value(1, Value::Int64(1)).unwrap();
    record.set_value(2, Value::Int32(1)).unwrap();
    record
        .set_value(3, Value::String("x".repeat(40_000)))
        .unwrap();

    let expected_len = record.encoded_len();
    let bytes = record.to_bytes().unwrap();
    assert_eq!(bytes.len(), expected_len);

    let view = RecordView::with_codec(registry.codec_for(&t).unwrap(), &bytes).unwrap();
    assert_eq!(view.get_value(3).unwrap(), Value::from(""));
}

#[test]
fn truncated_payload_is_an_error() {
    let t = inventory();
    let bytes = build(&t, &full_inventory()).into_bytes().unwrap();
    let codec = CodecRegistry::global().codec_for(&t).unwrap();
    assert!(codec.decode(&bytes[..bytes.len() - 3]).is_err());
}
