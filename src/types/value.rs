//! # Runtime Value Representation
//!
//! `Value` is the boxed, owned form of one field value. A record in its
//! value-array state is a `Vec<Value>` indexed by `field id - 1`; a PAX column
//! is a `Vec<Value>` with one entry per record.
//!
//! ## Value Variants
//!
//! | Variant | Rust Type | Declared kind |
//! |---------|-----------|---------------|
//! | Null | - | absent |
//! | Bool | bool | bool |
//! | Byte | i8 | byte |
//! | Int16 | i16 | i16 |
//! | Int32 | i32 | i32 |
//! | Int64 | i64 | i64 |
//! | Float | f32 | float |
//! | Double | f64 | double |
//! | String | String | string |
//! | Binary | Vec<u8> | binary |
//! | Group | Vec<Value> | nested record, indexed by nested id - 1 |
//! | List | Vec<Value> | list elements |
//!
//! ## Equality and Hashing
//!
//! Floats compare and hash by bit pattern. That makes `Value` a lawful `Eq +
//! Hash` key for frequency maps and dictionaries, at the cost of treating
//! `0.0` and `-0.0` as different and every NaN payload as distinct from the
//! others. Both properties match what the encoder writes to the buffer.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
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
    Group(Vec<Value>),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Byte(_) => "byte",
            Value::Int16(_) => "i16",
            Value::Int32(_) => "i32",
            Value::Int64(_) => "i64",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Group(_) => "group",
            Value::List(_) => "list",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(*v as i64),
            Value::Int16(v) => Some(*v as i64),
            Value::Int32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&[Value]> {
        match self {
            Value::Group(fields) => Some(fields),
            _ => None,
        }
    }

    /// Compares two values of the same variant.
    ///
    /// Returns None for NULL on either side and for mismatched variants.
    /// Floats use IEEE total ordering so NaN sorts deterministically.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Byte(a), Value::Byte(b)) => Some(a.cmp(b)),
            (Value::Int16(a), Value::Int16(b)) => Some(a.cmp(b)),
            (Value::Int32(a), Value::Int32(b)) => Some(a.cmp(b)),
            (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Some(a.total_cmp(b)),
            (Value::Double(a), Value::Double(b)) => Some(a.total_cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Binary(a), Value::Binary(b)) => Some(a.cmp(b)),
            (Value::Group(a), Value::Group(b)) | (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.compare_for_sort(y) {
                        Ordering::Equal => continue,
                        ord => return Some(ord),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => None,
        }
    }

    /// Total order for sorting: NULL sorts first, mismatched variants compare equal.
    pub fn compare_for_sort(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            _ => self.compare(other).unwrap_or(Ordering::Equal),
        }
    }

    /// Hashes this value, floats by bit pattern.
    pub fn hash_to<H: Hasher>(&self, hasher: &mut H) {
        std::mem::discriminant(self).hash(hasher);
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(hasher),
            Value::Byte(v) => v.hash(hasher),
            Value::Int16(v) => v.hash(hasher),
            Value::Int32(v) => v.hash(hasher),
            Value::Int64(v) => v.hash(hasher),
            Value::Float(v) => v.to_bits().hash(hasher),
            Value::Double(v) => v.to_bits().hash(hasher),
            Value::String(v) => v.hash(hasher),
            Value::Binary(v) => v.hash(hasher),
            Value::Group(items) | Value::List(items) => {
                items.len().hash(hasher);
                for item in items {
                    item.hash_to(hasher);
                }
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Group(a), Value::Group(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash_to(state);
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i8 => Byte,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float,
    f64 => Double,
    String => String,
    Vec<u8> => Binary,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(v: &Value) -> u64 {
        let mut h = DefaultHasher::new();
        v.hash(&mut h);
        h.finish()
    }

    #[test]
    fn floats_are_equal_by_bits() {
        assert_eq!(Value::Double(1.5), Value::Double(1.5));
        assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        assert_ne!(Value::Double(0.0), Value::Double(-0.0));
        assert_eq!(
            hash_of(&Value::Float(2.25)),
            hash_of(&Value::Float(2.25))
        );
    }

    #[test]
    fn variants_of_equal_payload_differ() {
        assert_ne!(Value::Int32(1), Value::Int64(1));
        assert_ne!(Value::Group(vec![]), Value::List(vec![]));
        assert_ne!(hash_of(&Value::Group(vec![])), hash_of(&Value::List(vec![])));
    }

    #[test]
    fn compare_null_is_unknown() {
        assert_eq!(Value::Null.compare(&Value::Int32(1)), None);
        assert_eq!(Value::Int32(1).compare(&Value::Int64(1)), None);
        assert_eq!(
            Value::Int32(1).compare(&Value::Int32(2)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn compare_for_sort_puts_null_first() {
        assert_eq!(
            Value::Null.compare_for_sort(&Value::String("a".into())),
            Ordering::Less
        );
        assert_eq!(
            Value::String("b".into()).compare_for_sort(&Value::String("a".into())),
            Ordering::Greater
        );
    }

    #[test]
    fn lists_compare_lexicographically() {
        let a = Value::List(vec![Value::Int32(1), Value::Int32(2)]);
        let b = Value::List(vec![Value::Int32(1), Value::Int32(3)]);
        let c = Value::List(vec![Value::Int32(1)]);
        assert_eq!(a.compare(&b), Some(Ordering::Less));
        assert_eq!(a.compare(&c), Some(Ordering::Greater));
    }

    #[test]
    fn from_conversions() {
        assert_eq!(Value::from(7i32), Value::Int32(7));
        assert_eq!(Value::from("x"), Value::String("x".into()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }
}
