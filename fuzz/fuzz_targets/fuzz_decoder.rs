//! Fuzz testing for the record decoder.
//!
//! Feeds arbitrary bytes to the row codec, record views and PAX views of a
//! fuzzer-chosen record type. Malformed input must surface as an error, never
//! a panic or an unbounded allocation.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use rowpax::pax::PaxView;
use rowpax::records::RecordView;
use rowpax::{CodecOptions, CodecRegistry, FieldDescriptor, FieldType, PrimitiveKind, RecordType};

#[derive(Debug, Arbitrary)]
struct DecoderInput {
    fields: Vec<FuzzField>,
    validate: bool,
    data: Vec<u8>,
}

#[derive(Debug, Arbitrary)]
struct FuzzField {
    kind: FuzzKind,
    shape: FuzzShape,
    has_reference: bool,
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

#[derive(Debug, Arbitrary, Clone, Copy)]
enum FuzzShape {
    Scalar,
    List,
    Group,
    ListOfGroup,
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

fn field_type(field: &FuzzField) -> Option<FieldType> {
    let scalar = FieldType::primitive(field.kind.into());
    let group = || {
        RecordType::new(
            "inner",
            vec![
                FieldDescriptor::new(1, "a", scalar.clone()),
                FieldDescriptor::new(2, "b", FieldType::primitive(PrimitiveKind::Int32)),
            ],
        )
        .ok()
    };
    Some(match field.shape {
        FuzzShape::Scalar => scalar.clone(),
        FuzzShape::List => FieldType::list(scalar.clone()),
        FuzzShape::Group => FieldType::group(group()?),
        FuzzShape::ListOfGroup => FieldType::list(FieldType::group(group()?)),
    })
}

fuzz_target!(|input: DecoderInput| {
    if input.fields.is_empty() || input.fields.len() > 32 || input.data.len() > 1 << 16 {
        return;
    }

    let mut descriptors = Vec::with_capacity(input.fields.len());
    for (i, field) in input.fields.iter().enumerate() {
        let Some(ty) = field_type(field) else {
            return;
        };
        let mut descriptor = FieldDescriptor::new(i as u16 + 1, format!("f{}", i), ty);
        if field.has_reference {
            descriptor = descriptor.has_reference();
        }
        descriptors.push(descriptor);
    }
    let Ok(record_type) = RecordType::new("fuzzed", descriptors) else {
        return;
    };

    let registry =
        CodecRegistry::with_options(CodecOptions::default().validate_on_decode(input.validate));
    let Ok(codec) = registry.codec_for(&record_type) else {
        return;
    };

    let _ = codec.decode(&input.data);

    if let Ok(view) = RecordView::with_codec(codec.clone(), &input.data) {
        for id in 1..=record_type.field_count() as u16 {
            let _ = view.get_value(id);
            let _ = view.list_size(id);
        }
    }

    if let Ok(pax) = PaxView::with_codec(codec, &input.data) {
        let _ = pax.records();
    }
});
