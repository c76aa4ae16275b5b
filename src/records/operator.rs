//! # Value Operators
//!
//! A `ValueOperator` is the byte-level strategy for one declared field type.
//! The codec builds one per field when it is created and never dispatches on
//! `FieldType` again while encoding or decoding.
//!
//! ## Payload Forms
//!
//! ```text
//! fixed primitive:  [raw big-endian bytes]
//! string:           [u16 len][utf8 bytes]
//! binary:           [i32 len][bytes]
//! group:            [i32 len][nested record bytes]
//! list:             [i32 len][i32 count][element]*
//! ```
//!
//! `metadata_length()` is the size of the length prefix and `num_bytes()` the
//! size of what follows it, so an encoded value is always
//! `metadata_length() + num_bytes(value)` bytes.
//!
//! ## Nesting
//!
//! Groups and lists are composite levels. A path from the root record may
//! cross at most `MAX_NESTING_DEPTH` of them and a list may never directly
//! hold another list. Both limits are enforced when the operator is built.

use std::sync::Arc;

use eyre::{ensure, Result};
use tracing::warn;

use crate::config::{
    CodecOptions, OversizedStringPolicy, BLOB_LENGTH_PREFIX, LIST_COUNT_PREFIX, MAX_NESTING_DEPTH,
    MAX_STRING_BYTES, STRING_LENGTH_PREFIX,
};
use crate::encoding::bytes::{
    read_f32, read_f64, read_i16, read_i32, read_i64, read_i8, read_len_i32, read_slice,
    read_u16, read_u8,
};
use crate::error::CodecError;
use crate::records::codec::RowCodec;
use crate::types::{FieldType, PrimitiveKind, Value};

#[derive(Debug, Clone)]
pub enum ValueOperator {
    Primitive(PrimitiveKind),
    Group(Arc<RowCodec>),
    Collection(Box<ValueOperator>),
}

impl ValueOperator {
    /// Builds the operator for `field_type` found at composite depth `depth`.
    ///
    /// `path` names the field for error messages.
    pub fn for_type(
        field_type: &FieldType,
        depth: usize,
        path: &str,
        options: CodecOptions,
    ) -> Result<Self> {
        match field_type {
            FieldType::Primitive(kind) => Ok(ValueOperator::Primitive(*kind)),
            FieldType::Group(record_type) => {
                let depth = Self::enter(depth, path)?;
                let codec = RowCodec::nested(record_type.clone(), options, depth, path)?;
                Ok(ValueOperator::Group(Arc::new(codec)))
            }
            FieldType::List(element) => {
                if element.is_list() {
                    return Err(CodecError::UnsupportedNesting {
                        path: path.to_string(),
                        reason: "a list cannot directly contain another list",
                    }
                    .into());
                }
                let depth = Self::enter(depth, path)?;
                let element = Self::for_type(element, depth, &format!("{}[]", path), options)?;
                Ok(ValueOperator::Collection(Box::new(element)))
            }
        }
    }

    fn enter(depth: usize, path: &str) -> Result<usize> {
        let depth = depth + 1;
        if depth > MAX_NESTING_DEPTH {
            return Err(CodecError::UnsupportedNesting {
                path: path.to_string(),
                reason: "more than two levels of group or list nesting",
            }
            .into());
        }
        Ok(depth)
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueOperator::Primitive(kind), v) => kind.accepts(v),
            (ValueOperator::Group(codec), Value::Group(fields)) => codec.is_valid_tuple(fields),
            (ValueOperator::Collection(element), Value::List(items)) => {
                items.iter().all(|item| element.is_valid(item))
            }
            _ => false,
        }
    }

    pub fn has_fixed_length(&self) -> bool {
        match self {
            ValueOperator::Primitive(kind) => !kind.is_variable(),
            ValueOperator::Group(_) | ValueOperator::Collection(_) => false,
        }
    }

    /// Size of the length prefix written before the payload.
    pub fn metadata_length(&self) -> usize {
        match self {
            ValueOperator::Primitive(PrimitiveKind::String) => STRING_LENGTH_PREFIX,
            ValueOperator::Primitive(PrimitiveKind::Binary) => BLOB_LENGTH_PREFIX,
            ValueOperator::Primitive(_) => 0,
            ValueOperator::Group(_) | ValueOperator::Collection(_) => BLOB_LENGTH_PREFIX,
        }
    }

    /// Payload size of a valid `value`, excluding the length prefix.
    ///
    /// Oversized strings report their real length here; the encoder decides
    /// what to do with them.
    pub fn num_bytes(&self, value: &Value) -> usize {
        match (self, value) {
            (ValueOperator::Primitive(kind), v) => match kind.fixed_size() {
                Some(size) => size,
                None => match v {
                    Value::String(s) => s.len(),
                    Value::Binary(b) => b.len(),
                    _ => 0,
                },
            },
            (ValueOperator::Group(codec), Value::Group(fields)) => codec.encoded_len(fields),
            (ValueOperator::Collection(element), Value::List(items)) => {
                LIST_COUNT_PREFIX
                    + items
                        .iter()
                        .map(|item| element.metadata_length() + element.num_bytes(item))
                        .sum::<usize>()
            }
            _ => 0,
        }
    }

    /// Bytes `write_value` will append for a valid `value` under `options`.
    pub fn encoded_len(&self, value: &Value, options: CodecOptions) -> usize {
        match (self, value) {
            (ValueOperator::Primitive(PrimitiveKind::String), Value::String(s))
                if s.len() > MAX_STRING_BYTES
                    && options.oversized_string_policy() == OversizedStringPolicy::WriteEmpty =>
            {
                STRING_LENGTH_PREFIX
            }
            (ValueOperator::Collection(element), Value::List(items)) => {
                BLOB_LENGTH_PREFIX
                    + LIST_COUNT_PREFIX
                    + items
                        .iter()
                        .map(|item| element.encoded_len(item, options))
                        .sum::<usize>()
            }
            _ => self.metadata_length() + self.num_bytes(value),
        }
    }

    /// Appends the length prefix and payload of a valid `value` to `out`.
    /// A value of any other variant than the operator's type is an error.
    pub fn write_value(
        &self,
        value: &Value,
        out: &mut Vec<u8>,
        options: CodecOptions,
    ) -> Result<()> {
        match (self, value) {
            (ValueOperator::Primitive(PrimitiveKind::Bool), Value::Bool(v)) => {
                out.push(u8::from(*v))
            }
            (ValueOperator::Primitive(PrimitiveKind::Byte), Value::Byte(v)) => out.push(*v as u8),
            (ValueOperator::Primitive(PrimitiveKind::Int16), Value::Int16(v)) => {
                out.extend_from_slice(&v.to_be_bytes())
            }
            (ValueOperator::Primitive(PrimitiveKind::Int32), Value::Int32(v)) => {
                out.extend_from_slice(&v.to_be_bytes())
            }
            (ValueOperator::Primitive(PrimitiveKind::Int64), Value::Int64(v)) => {
                out.extend_from_slice(&v.to_be_bytes())
            }
            (ValueOperator::Primitive(PrimitiveKind::Float), Value::Float(v)) => {
                out.extend_from_slice(&v.to_bits().to_be_bytes())
            }
            (ValueOperator::Primitive(PrimitiveKind::Double), Value::Double(v)) => {
                out.extend_from_slice(&v.to_bits().to_be_bytes())
            }
            (ValueOperator::Primitive(PrimitiveKind::String), Value::String(s)) => {
                let bytes = if s.len() > MAX_STRING_BYTES {
                    match options.oversized_string_policy() {
                        OversizedStringPolicy::Reject => {
                            return Err(CodecError::StringTooLong {
                                len: s.len(),
                                max: MAX_STRING_BYTES,
                            }
                            .into())
                        }
                        OversizedStringPolicy::WriteEmpty => {
                            warn!(
                                len = s.len(),
                                max = MAX_STRING_BYTES,
                                "string too long for its u16 length prefix, writing it empty"
                            );
                            &[][..]
                        }
                    }
                } else {
                    s.as_bytes()
                };
                out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
                out.extend_from_slice(bytes);
            }
            (ValueOperator::Primitive(PrimitiveKind::Binary), Value::Binary(b)) => {
                ensure!(
                    b.len() <= i32::MAX as usize,
                    "binary value of {} bytes exceeds the i32 length prefix",
                    b.len()
                );
                out.extend_from_slice(&(b.len() as i32).to_be_bytes());
                out.extend_from_slice(b);
            }
            (ValueOperator::Group(codec), Value::Group(fields)) => {
                let len_pos = out.len();
                out.extend_from_slice(&[0u8; BLOB_LENGTH_PREFIX]);
                codec.encode_into(fields, out)?;
                let len = out.len() - len_pos - BLOB_LENGTH_PREFIX;
                out[len_pos..len_pos + BLOB_LENGTH_PREFIX]
                    .copy_from_slice(&(len as i32).to_be_bytes());
            }
            (ValueOperator::Collection(element), Value::List(items)) => {
                let len_pos = out.len();
                out.extend_from_slice(&[0u8; BLOB_LENGTH_PREFIX]);
                out.extend_from_slice(&(items.len() as i32).to_be_bytes());
                for item in items {
                    element.write_value(item, out, options)?;
                }
                let len = out.len() - len_pos - BLOB_LENGTH_PREFIX;
                out[len_pos..len_pos + BLOB_LENGTH_PREFIX]
                    .copy_from_slice(&(len as i32).to_be_bytes());
            }
            (op, v) => eyre::bail!(
                "{} cannot be written by the {} operator",
                v.kind_name(),
                op.describe()
            ),
        }
        Ok(())
    }

    /// Encodes one value on its own, prefix included.
    pub fn to_bytes(&self, value: &Value, options: CodecOptions) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len(value, options));
        self.write_value(value, &mut out, options)?;
        Ok(out)
    }

    /// Decodes the value starting at `offset`; returns it and the bytes consumed.
    pub fn read_value(&self, buf: &[u8], offset: usize) -> Result<(Value, usize)> {
        match self {
            ValueOperator::Primitive(kind) => Self::read_primitive(*kind, buf, offset),
            ValueOperator::Group(codec) => {
                let len = read_len_i32(buf, offset)?;
                let body = read_slice(buf, offset + BLOB_LENGTH_PREFIX, len, "group payload")?;
                let fields = codec.decode(body)?;
                Ok((Value::Group(fields), BLOB_LENGTH_PREFIX + len))
            }
            ValueOperator::Collection(element) => {
                let len = read_len_i32(buf, offset)?;
                let body = read_slice(buf, offset + BLOB_LENGTH_PREFIX, len, "list payload")?;
                let count = read_len_i32(body, 0)?;
                let mut items = Vec::with_capacity(count.min(body.len()));
                let mut cursor = LIST_COUNT_PREFIX;
                for _ in 0..count {
                    let (item, used) = element.read_value(body, cursor)?;
                    items.push(item);
                    cursor += used;
                }
                ensure!(
                    cursor == len,
                    "list payload declares {} bytes but its {} elements use {}",
                    len,
                    count,
                    cursor
                );
                Ok((Value::List(items), BLOB_LENGTH_PREFIX + len))
            }
        }
    }

    fn read_primitive(kind: PrimitiveKind, buf: &[u8], offset: usize) -> Result<(Value, usize)> {
        Ok(match kind {
            PrimitiveKind::Bool => (Value::Bool(read_u8(buf, offset)? != 0), 1),
            PrimitiveKind::Byte => (Value::Byte(read_i8(buf, offset)?), 1),
            PrimitiveKind::Int16 => (Value::Int16(read_i16(buf, offset)?), 2),
            PrimitiveKind::Int32 => (Value::Int32(read_i32(buf, offset)?), 4),
            PrimitiveKind::Int64 => (Value::Int64(read_i64(buf, offset)?), 8),
            PrimitiveKind::Float => (Value::Float(read_f32(buf, offset)?), 4),
            PrimitiveKind::Double => (Value::Double(read_f64(buf, offset)?), 8),
            PrimitiveKind::String => {
                let len = read_u16(buf, offset)? as usize;
                let bytes = read_slice(buf, offset + STRING_LENGTH_PREFIX, len, "string payload")?;
                let s = std::str::from_utf8(bytes)
                    .map_err(|e| eyre::eyre!("invalid UTF-8 in string at offset {}: {}", offset, e))?;
                (Value::String(s.to_string()), STRING_LENGTH_PREFIX + len)
            }
            PrimitiveKind::Binary => {
                let len = read_len_i32(buf, offset)?;
                let bytes = read_slice(buf, offset + BLOB_LENGTH_PREFIX, len, "binary payload")?;
                (Value::Binary(bytes.to_vec()), BLOB_LENGTH_PREFIX + len)
            }
        })
    }

    /// Bytes taken by the value at `offset`, found from its length prefix
    /// without decoding it.
    pub fn skip_len(&self, buf: &[u8], offset: usize) -> Result<usize> {
        let len = match self {
            ValueOperator::Primitive(kind) => match kind.fixed_size() {
                Some(size) => size,
                None if *kind == PrimitiveKind::String => {
                    STRING_LENGTH_PREFIX + read_u16(buf, offset)? as usize
                }
                None => BLOB_LENGTH_PREFIX + read_len_i32(buf, offset)?,
            },
            ValueOperator::Group(_) | ValueOperator::Collection(_) => {
                BLOB_LENGTH_PREFIX + read_len_i32(buf, offset)?
            }
        };
        ensure!(
            offset + len <= buf.len(),
            "{} value at offset {} runs past the end of the buffer",
            self.describe(),
            offset
        );
        Ok(len)
    }

    /// Reads the element count of the list payload at `offset` without
    /// decoding the elements.
    pub fn read_list_len(&self, buf: &[u8], offset: usize) -> Result<usize> {
        ensure!(
            matches!(self, ValueOperator::Collection(_)),
            "{} operator has no element count",
            self.describe()
        );
        read_len_i32(buf, offset + BLOB_LENGTH_PREFIX)
    }

    pub fn describe(&self) -> String {
        match self {
            ValueOperator::Primitive(kind) => kind.name().to_string(),
            ValueOperator::Group(codec) => format!("group<{}>", codec.record_type().name()),
            ValueOperator::Collection(element) => format!("list<{}>", element.describe()),
        }
    }
}
