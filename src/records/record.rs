//! # Records
//!
//! The `Record` trait is the field-level API shared by owned and borrowed
//! records. `WritableRecord` is the owned, mutable implementation.
//!
//! ## State Machine
//!
//! A `WritableRecord` holds exactly one authoritative representation:
//!
//! ```text
//!            set_value / full decode
//!   Bytes ─────────────────────────────▶ Values
//!     ▲                                    │
//!     └──────── record_buffer / to_bytes ──┘
//! ```
//!
//! - `Bytes`: the packed buffer. Sort key, reference and list fields are read
//!   through their reference-section slot without decoding anything else.
//!   Any other field forces a full decode into `Values`.
//! - `Values`: the value array plus the running encoded length, kept exact by
//!   adding the size delta of every `set_value`.
//!
//! Asking for the buffer while in `Values` encodes and drops the array.
//!
//! ## Reads of Absent Fields
//!
//! A field that would not be written (NULL, a value of the wrong type, or the
//! default itself) reads back as the field's default, or NULL without one, in
//! both states. Reading a record never depends on which state it is in.

use std::cmp::Ordering;
use std::sync::Arc;

use eyre::Result;
use tracing::trace;

use crate::records::codec::RowCodec;
use crate::records::compare::SortKeyComparator;
use crate::records::registry::CodecRegistry;
use crate::records::view::RecordView;
use crate::types::{RecordType, Value};

/// Field-level access to one record.
pub trait Record {
    fn record_type(&self) -> &Arc<RecordType>;

    /// Value of the field `id`; absent fields yield their default or NULL.
    fn get_value(&mut self, id: u16) -> Result<Value>;

    fn set_value(&mut self, id: u16, value: Value) -> Result<()>;

    /// Element count of the list field `id`, 0 when the list is absent.
    fn list_size(&mut self, id: u16) -> Result<usize>;

    /// The encoded record.
    fn to_bytes(&mut self) -> Result<Vec<u8>>;

    fn is_read_only(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
enum State {
    Values { values: Vec<Value>, len: usize },
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct WritableRecord {
    codec: Arc<RowCodec>,
    state: State,
}

impl WritableRecord {
    /// Empty record of `record_type`, using the global codec registry.
    pub fn new(record_type: &Arc<RecordType>) -> Result<Self> {
        Ok(Self::with_codec(CodecRegistry::global().codec_for(record_type)?))
    }

    pub fn with_codec(codec: Arc<RowCodec>) -> Self {
        let values = vec![Value::Null; codec.field_count()];
        let len = codec.header_len();
        Self {
            codec,
            state: State::Values { values, len },
        }
    }

    /// Takes ownership of an encoded record.
    pub fn from_bytes(record_type: &Arc<RecordType>, bytes: Vec<u8>) -> Result<Self> {
        Self::from_buffer(CodecRegistry::global().codec_for(record_type)?, bytes)
    }

    pub fn from_buffer(codec: Arc<RowCodec>, bytes: Vec<u8>) -> Result<Self> {
        codec.check_header(&bytes)?;
        Ok(Self {
            codec,
            state: State::Bytes(bytes),
        })
    }

    /// Deep copy of an encoded record.
    pub fn copy_from(record_type: &Arc<RecordType>, bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(record_type, bytes.to_vec())
    }

    pub fn codec(&self) -> &Arc<RowCodec> {
        &self.codec
    }

    /// Clears every field back to unset.
    pub fn reset(&mut self) {
        self.state = State::Values {
            values: vec![Value::Null; self.codec.field_count()],
            len: self.codec.header_len(),
        };
    }

    pub fn is_encoded(&self) -> bool {
        matches!(self.state, State::Bytes(_))
    }

    /// Encoded size of the record in its current state.
    pub fn encoded_len(&self) -> usize {
        match &self.state {
            State::Values { len, .. } => *len,
            State::Bytes(buf) => buf.len(),
        }
    }

    /// The encoded record, encoding the value array first if it is current.
    pub fn record_buffer(&mut self) -> Result<&[u8]> {
        if let State::Values { values, len } = &self.state {
            let buf = self.codec.encode(values)?;
            debug_assert_eq!(buf.len(), *len);
            self.state = State::Bytes(buf);
        }
        let State::Bytes(buf) = &self.state else {
            eyre::bail!("record of '{}' was not encoded", self.codec.record_type().name());
        };
        Ok(buf)
    }

    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        self.record_buffer()?;
        let State::Bytes(buf) = self.state else {
            eyre::bail!("record of '{}' was not encoded", self.codec.record_type().name());
        };
        Ok(buf)
    }

    /// Borrowed read-only view of the encoded record.
    pub fn as_view(&mut self) -> Result<RecordView<'_>> {
        let codec = self.codec.clone();
        RecordView::with_codec(codec, self.record_buffer()?)
    }

    /// Sorts `records` by the sort key of their type, honouring its order.
    pub fn sort_by_key(records: &mut Vec<WritableRecord>) -> Result<()> {
        let Some(first) = records.first() else {
            return Ok(());
        };
        let comparator = SortKeyComparator::for_type(first.codec.record_type())?;
        comparator.sort(records)
    }

    /// Compares two records of the same type by their sort key.
    pub fn cmp_by_key(&mut self, other: &mut WritableRecord) -> Result<Ordering> {
        SortKeyComparator::for_type(self.codec.record_type())?.compare_records(self, other)
    }

    fn field_idx(&self, id: u16) -> Result<usize> {
        self.codec.record_type().require_field(id)?;
        Ok(id as usize - 1)
    }

    fn values_mut(&mut self) -> Result<(&mut Vec<Value>, &mut usize)> {
        if let State::Bytes(buf) = &self.state {
            let values = self.codec.decode(buf)?;
            // a lenient decode may accept bytes the encoder would not write back
            let len = self.codec.encoded_len(&values);
            self.state = State::Values { values, len };
        }
        let State::Values { values, len } = &mut self.state else {
            eyre::bail!("record of '{}' was not decoded", self.codec.record_type().name());
        };
        Ok((values, len))
    }

    fn read_value(&self, idx: usize, value: &Value) -> Value {
        if self.codec.is_present(idx, value) {
            value.clone()
        } else {
            self.codec.record_type().fields()[idx].absent_value()
        }
    }
}

impl Record for WritableRecord {
    fn record_type(&self) -> &Arc<RecordType> {
        self.codec.record_type()
    }

    fn get_value(&mut self, id: u16) -> Result<Value> {
        let idx = self.field_idx(id)?;
        if let State::Bytes(buf) = &self.state {
            let layout = self.codec.layout();
            if layout.is_fast_path(idx) {
                trace!(field = id, "reading field through its offset slot");
                let offset = layout.fast_path_offset(idx, buf)?;
                return self.codec.decode_field_at(idx, buf, offset);
            }
        }
        let codec = self.codec.clone();
        let (values, _) = self.values_mut()?;
        let value = &values[idx];
        Ok(if codec.is_present(idx, value) {
            value.clone()
        } else {
            codec.record_type().fields()[idx].absent_value()
        })
    }

    fn set_value(&mut self, id: u16, value: Value) -> Result<()> {
        let idx = self.field_idx(id)?;
        let codec = self.codec.clone();
        let (values, len) = self.values_mut()?;
        let old = codec.value_size(idx, &values[idx]);
        let new = codec.value_size(idx, &value);
        *len = *len - old + new;
        values[idx] = value;
        Ok(())
    }

    fn list_size(&mut self, id: u16) -> Result<usize> {
        let idx = self.field_idx(id)?;
        match &self.state {
            State::Bytes(buf) => {
                let offset = self.codec.layout().collection_field_offset(id, buf)?;
                match offset {
                    Some(offset) => self.codec.operator_at(idx).read_list_len(buf, offset),
                    None => Ok(0),
                }
            }
            State::Values { values, .. } => {
                eyre::ensure!(
                    self.codec.record_type().fields()[idx].is_list(),
                    "field {} of '{}' is not a list field",
                    id,
                    self.codec.record_type().name()
                );
                Ok(self
                    .read_value(idx, &values[idx])
                    .as_list()
                    .map_or(0, <[Value]>::len))
            }
        }
    }

    fn to_bytes(&mut self) -> Result<Vec<u8>> {
        Ok(self.record_buffer()?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecOptions;
    use crate::types::{FieldDescriptor, FieldType, PrimitiveKind};

    fn counter() -> Arc<RecordType> {
        RecordType::new(
            "counter",
            vec![
                FieldDescriptor::new(1, "name", FieldType::primitive(PrimitiveKind::String)),
                FieldDescriptor::new(2, "hits", FieldType::primitive(PrimitiveKind::Int64))
                    .with_default(0i64),
                FieldDescriptor::new(
                    3,
                    "samples",
                    FieldType::list(FieldType::primitive(PrimitiveKind::Int32)),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn running_length_matches_encoding() {
        let mut record = WritableRecord::new(&counter()).unwrap();
        record.set_value(1, Value::from("page")).unwrap();
        record.set_value(2, Value::Int64(3)).unwrap();
        record.set_value(1, Value::from("longer page")).unwrap();
        record.set_value(2, Value::Int64(0)).unwrap();
        let expected = record.encoded_len();
        assert_eq!(record.record_buffer().unwrap().len(), expected);
    }

    #[test]
    fn set_then_get_across_states() {
        let mut record = WritableRecord::new(&counter()).unwrap();
        record
            .set_value(3, Value::List(vec![Value::Int32(1), Value::Int32(2)]))
            .unwrap();
        assert_eq!(record.list_size(3).unwrap(), 2);
        record.record_buffer().unwrap();
        assert!(record.is_encoded());
        assert_eq!(record.list_size(3).unwrap(), 2);
        assert_eq!(record.get_value(2).unwrap(), Value::Int64(0));
        assert!(!record.is_encoded());
    }

    #[test]
    fn list_size_of_absent_list_is_zero() {
        let mut record = WritableRecord::new(&counter()).unwrap();
        assert_eq!(record.list_size(3).unwrap(), 0);
        record.record_buffer().unwrap();
        assert_eq!(record.list_size(3).unwrap(), 0);
        assert!(record.list_size(1).is_err());
    }

    #[test]
    fn running_length_ignores_foreign_buffer_bytes() {
        let registry =
            CodecRegistry::with_options(CodecOptions::default().validate_on_decode(false));
        let codec = registry.codec_for(&counter()).unwrap();
        let mut record = WritableRecord::with_codec(codec.clone());
        record.set_value(1, Value::from("page")).unwrap();
        record.set_value(2, Value::Int64(5)).unwrap();
        let mut bytes = record.into_bytes().unwrap();
        bytes.extend_from_slice(&[0; 5]);

        let mut reread = WritableRecord::from_buffer(codec, bytes).unwrap();
        reread.set_value(2, Value::Int64(6)).unwrap();
        let expected = reread.encoded_len();
        assert_eq!(reread.record_buffer().unwrap().len(), expected);
    }

    #[test]
    fn reset_clears_fields() {
        let mut record = WritableRecord::new(&counter()).unwrap();
        record.set_value(1, Value::from("x")).unwrap();
        record.reset();
        assert_eq!(record.get_value(1).unwrap(), Value::Null);
        assert_eq!(record.encoded_len(), record.codec().header_len());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut record = WritableRecord::new(&counter()).unwrap();
        assert!(record.get_value(0).is_err());
        assert!(record.set_value(4, Value::Int32(1)).is_err());
    }

    #[test]
    fn copy_is_independent() {
        let mut source = WritableRecord::new(&counter()).unwrap();
        source.set_value(1, Value::from("a")).unwrap();
        let bytes = source.to_bytes().unwrap();
        let mut copy = WritableRecord::copy_from(&counter(), &bytes).unwrap();
        copy.set_value(1, Value::from("b")).unwrap();
        assert_eq!(source.get_value(1).unwrap(), Value::from("a"));
        assert_eq!(copy.get_value(1).unwrap(), Value::from("b"));
    }
}
