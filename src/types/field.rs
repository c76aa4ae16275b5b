//! # Field Descriptors
//!
//! A `FieldDescriptor` pairs a field id and `FieldType` with the constraint
//! flags the codec cares about and an optional default value.
//!
//! ## Ids
//!
//! Persisted fields carry dense ids starting at 1; the value array of a record
//! is indexed by `id - 1`. Id 0 marks a derived field: it is part of the type
//! description but is never encoded.
//!
//! ## Usage
//!
//! ```ignore
//! use rowpax::types::{FieldDescriptor, FieldType, PrimitiveKind, SortOrder};
//!
//! let id = FieldDescriptor::new(1, "id", FieldType::primitive(PrimitiveKind::Int64))
//!     .required()
//!     .has_reference();
//! let rank = FieldDescriptor::new(2, "rank", FieldType::primitive(PrimitiveKind::Int32))
//!     .required()
//!     .sort_key(SortOrder::Descending);
//! let label = FieldDescriptor::new(3, "label", FieldType::primitive(PrimitiveKind::String))
//!     .with_default("Unknown");
//! ```

use super::{FieldType, PrimitiveKind, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Constraint flags of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldFlags {
    pub required: bool,
    pub sort_key: Option<SortOrder>,
    /// Frequently used: the field gets an O(1) slot in the reference section.
    pub has_reference: bool,
    pub derived: bool,
    pub large_list: bool,
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    id: u16,
    name: String,
    field_type: FieldType,
    flags: FieldFlags,
    default: Option<Value>,
}

impl FieldDescriptor {
    pub fn new(id: u16, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id,
            name: name.into(),
            field_type,
            flags: FieldFlags::default(),
            default: None,
        }
    }

    /// Creates a derived (computed, never persisted) field. Its id is 0.
    pub fn derived(name: impl Into<String>, field_type: FieldType) -> Self {
        let mut field = Self::new(0, name, field_type);
        field.flags.derived = true;
        field
    }

    pub fn required(mut self) -> Self {
        self.flags.required = true;
        self
    }

    pub fn sort_key(mut self, order: SortOrder) -> Self {
        self.flags.sort_key = Some(order);
        self
    }

    pub fn has_reference(mut self) -> Self {
        self.flags.has_reference = true;
        self
    }

    pub fn large_list(mut self) -> Self {
        self.flags.large_list = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn flags(&self) -> FieldFlags {
        self.flags
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.flags.required
    }

    pub fn is_derived(&self) -> bool {
        self.flags.derived || self.id == 0
    }

    pub fn is_sort_key(&self) -> bool {
        self.flags.sort_key.is_some()
    }

    pub fn sort_order(&self) -> Option<SortOrder> {
        self.flags.sort_key
    }

    pub fn is_list(&self) -> bool {
        self.field_type.is_list()
    }

    /// Reference-section fields are flagged non-list fields; lists get their
    /// own collection slot instead.
    pub fn is_reference(&self) -> bool {
        self.flags.has_reference && !self.is_list()
    }

    /// Value a field decodes to when its payload is absent.
    pub fn absent_value(&self) -> Value {
        self.default.clone().unwrap_or(Value::Null)
    }

    /// Whether this field may carry a default: optional, primitive and not binary.
    pub fn accepts_default(&self) -> bool {
        !self.flags.required
            && matches!(
                self.field_type.as_primitive(),
                Some(kind) if kind != PrimitiveKind::Binary
            )
    }
}
