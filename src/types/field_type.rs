//! # Field Types
//!
//! `PrimitiveKind` is the storage-level discriminant of a scalar field and
//! `FieldType` the full declared type, including nested groups and lists.
//!
//! ## Primitive Sizes
//!
//! | Kind | Payload | Length prefix |
//! |------|---------|---------------|
//! | Bool | 1 | 0 |
//! | Byte | 1 | 0 |
//! | Int16 | 2 | 0 |
//! | Int32 | 4 | 0 |
//! | Int64 | 8 | 0 |
//! | Float | 4 | 0 |
//! | Double | 8 | 0 |
//! | String | variable | 2 (u16) |
//! | Binary | variable | 4 (i32) |
//!
//! Groups and lists always carry a 4-byte length prefix.

use std::fmt;
use std::sync::Arc;

use crate::types::{RecordType, Value};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool = 0,
    Byte = 1,
    Int16 = 2,
    Int32 = 3,
    Int64 = 4,
    Float = 5,
    Double = 6,
    String = 7,
    Binary = 8,
}

impl PrimitiveKind {
    /// Returns the fixed byte size for this kind, or None for variable-length kinds.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            PrimitiveKind::Bool | PrimitiveKind::Byte => Some(1),
            PrimitiveKind::Int16 => Some(2),
            PrimitiveKind::Int32 | PrimitiveKind::Float => Some(4),
            PrimitiveKind::Int64 | PrimitiveKind::Double => Some(8),
            PrimitiveKind::String | PrimitiveKind::Binary => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        self.fixed_size().is_none()
    }

    /// Whether `value` is the variant this kind stores. NULL is not accepted.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (PrimitiveKind::Bool, Value::Bool(_))
                | (PrimitiveKind::Byte, Value::Byte(_))
                | (PrimitiveKind::Int16, Value::Int16(_))
                | (PrimitiveKind::Int32, Value::Int32(_))
                | (PrimitiveKind::Int64, Value::Int64(_))
                | (PrimitiveKind::Float, Value::Float(_))
                | (PrimitiveKind::Double, Value::Double(_))
                | (PrimitiveKind::String, Value::String(_))
                | (PrimitiveKind::Binary, Value::Binary(_))
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Int16 => "i16",
            PrimitiveKind::Int32 => "i32",
            PrimitiveKind::Int64 => "i64",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::String => "string",
            PrimitiveKind::Binary => "binary",
        }
    }
}

impl TryFrom<u8> for PrimitiveKind {
    type Error = eyre::Report;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => PrimitiveKind::Bool,
            1 => PrimitiveKind::Byte,
            2 => PrimitiveKind::Int16,
            3 => PrimitiveKind::Int32,
            4 => PrimitiveKind::Int64,
            5 => PrimitiveKind::Float,
            6 => PrimitiveKind::Double,
            7 => PrimitiveKind::String,
            8 => PrimitiveKind::Binary,
            other => eyre::bail!("unknown primitive kind {}", other),
        })
    }
}

/// Declared type of a field.
#[derive(Debug, Clone)]
pub enum FieldType {
    Primitive(PrimitiveKind),
    /// A nested record, encoded with its own row layout.
    Group(Arc<RecordType>),
    /// A list of elements of the boxed type.
    List(Box<FieldType>),
}

impl FieldType {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        FieldType::Primitive(kind)
    }

    pub fn group(record_type: Arc<RecordType>) -> Self {
        FieldType::Group(record_type)
    }

    pub fn list(element: FieldType) -> Self {
        FieldType::List(Box::new(element))
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            FieldType::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FieldType::List(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self, FieldType::Group(_))
    }
}

impl PartialEq for FieldType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldType::Primitive(a), FieldType::Primitive(b)) => a == b,
            (FieldType::Group(a), FieldType::Group(b)) => Arc::ptr_eq(a, b) || a.name() == b.name(),
            (FieldType::List(a), FieldType::List(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Primitive(kind) => f.write_str(kind.name()),
            FieldType::Group(record_type) => write!(f, "group<{}>", record_type.name()),
            FieldType::List(element) => write!(f, "list<{}>", element),
        }
    }
}
