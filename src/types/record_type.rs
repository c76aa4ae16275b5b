//! # Record Types
//!
//! A `RecordType` is the ordered field list of one record type: the only part
//! of the schema model the codec consumes. Construction checks the structural
//! invariants the byte layout depends on and nothing more.
//!
//! ## Invariants Checked by `RecordType::new`
//!
//! - persisted field ids are exactly `1..=n`; derived fields use id 0
//! - at most one sort key, and it is a required primitive field
//! - defaults only on optional, primitive, non-binary fields, of the declared kind
//! - at most 255 list fields and 255 reference fields (count bytes are u8)
//!
//! Nesting depth is checked later, when a codec is built for the type, since a
//! nested type is valid on its own and only too deep relative to a root.

use std::sync::Arc;

use eyre::{ensure, Result};

use crate::config::MAX_REFERENCE_GROUP_LEN;
use crate::error::CodecError;
use crate::types::{FieldDescriptor, SortOrder};

#[derive(Debug, Clone)]
pub struct RecordType {
    name: String,
    fields: Vec<FieldDescriptor>,
    derived: Vec<FieldDescriptor>,
    sort_key_idx: Option<usize>,
}

impl RecordType {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Result<Arc<Self>> {
        let name = name.into();
        let (mut persisted, derived): (Vec<_>, Vec<_>) =
            fields.into_iter().partition(|f| !f.is_derived());
        persisted.sort_by_key(|f| f.id());

        ensure!(
            persisted.len() <= u16::MAX as usize,
            "record type '{}' has {} fields, more than a u16 field count holds",
            name,
            persisted.len()
        );

        for (idx, field) in persisted.iter().enumerate() {
            ensure!(
                field.id() as usize == idx + 1,
                "record type '{}': field ids must be dense from 1, found id {} at position {}",
                name,
                field.id(),
                idx + 1
            );
        }

        let mut sort_key_idx = None;
        for (idx, field) in persisted.iter().enumerate() {
            if field.is_sort_key() {
                ensure!(
                    sort_key_idx.is_none(),
                    "record type '{}' declares more than one sort key",
                    name
                );
                ensure!(
                    field.is_required(),
                    "sort key '{}' of '{}' must be required",
                    field.name(),
                    name
                );
                ensure!(
                    field.field_type().as_primitive().is_some(),
                    "sort key '{}' of '{}' must be a primitive field",
                    field.name(),
                    name
                );
                sort_key_idx = Some(idx);
            }

            if let Some(default) = field.default_value() {
                ensure!(
                    field.accepts_default(),
                    "field '{}' of '{}' cannot carry a default: only optional non-binary primitives can",
                    field.name(),
                    name
                );
                let kind = field.field_type().as_primitive();
                if !kind.is_some_and(|k| k.accepts(default)) {
                    return Err(CodecError::TypeMismatch {
                        id: field.id(),
                        expected: field.field_type().to_string(),
                        actual: default.kind_name(),
                    }
                    .into());
                }
            }
        }

        for field in &derived {
            ensure!(
                field.id() == 0,
                "derived field '{}' of '{}' must use id 0",
                field.name(),
                name
            );
            ensure!(
                !field.is_sort_key(),
                "derived field '{}' of '{}' cannot be a sort key",
                field.name(),
                name
            );
        }

        let list_count = persisted.iter().filter(|f| f.is_list()).count();
        let reference_count = persisted.iter().filter(|f| f.is_reference()).count();
        ensure!(
            list_count <= MAX_REFERENCE_GROUP_LEN && reference_count <= MAX_REFERENCE_GROUP_LEN,
            "record type '{}' has {} list and {} reference fields, at most {} of each fit",
            name,
            list_count,
            reference_count,
            MAX_REFERENCE_GROUP_LEN
        );

        Ok(Arc::new(Self {
            name,
            fields: persisted,
            derived,
            sort_key_idx,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Persisted fields in id order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn derived_fields(&self) -> &[FieldDescriptor] {
        &self.derived
    }

    /// Number of persisted fields; the length of the value array.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, id: u16) -> Option<&FieldDescriptor> {
        if id == 0 {
            return None;
        }
        self.fields.get(id as usize - 1)
    }

    /// Like `field`, but an unknown id is an `UnknownField` error.
    pub fn require_field(&self, id: u16) -> Result<&FieldDescriptor> {
        self.field(id).ok_or_else(|| {
            CodecError::UnknownField {
                record_type: self.name.clone(),
                id,
            }
            .into()
        })
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn sort_key(&self) -> Option<&FieldDescriptor> {
        self.sort_key_idx.map(|idx| &self.fields[idx])
    }

    pub fn sort_order(&self) -> Option<SortOrder> {
        self.sort_key().and_then(|f| f.sort_order())
    }

    pub fn null_bitmap_size(field_count: usize) -> usize {
        field_count.div_ceil(8)
    }
}
