//! # PAX Batches
//!
//! A PAX batch stores records of one type column by column, compressing each
//! column with the cheapest scheme.
//!
//! ## Buffer Layout
//!
//! ```text
//! +----------------+----------+----------+-----+-------------------------+
//! | PaxHeader (8B) | column 0 | column 1 | ... | footer: i32 offset x n  |
//! +----------------+----------+----------+-----+-------------------------+
//!
//! PaxHeader: u16 0xFFFF, u16 field count, i32 record count (big-endian)
//! column:    [tag u8][payload]
//!            [tag | 0x80][null bitmap][payload]  when the column holds NULLs
//! ```
//!
//! Footer offsets are absolute positions of each column's tag byte, so any
//! column is reached in O(1) from the end of the buffer.
//!
//! ## Nullable Columns
//!
//! A field with no default that is absent in some records yields NULLs. Such
//! a column sets the high bit of its tag and is preceded by a bitmap with one
//! bit per record (1 = NULL); the scheme then covers only the non-null
//! values. Columns without NULLs are unaffected.

use std::sync::Arc;

use eyre::{ensure, Result};
use tracing::debug;
use zerocopy::big_endian::{I32, U16};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::{
    MAX_RUN_LENGTH, NULLABLE_COLUMN_FLAG, PAX_FOOTER_ENTRY_SIZE, PAX_HEADER_SIZE, PAX_TYPE_TAG,
};
use crate::error::CodecError;
use crate::encoding::bitmap::{bitmap_len, from_predicate, is_set};
use crate::encoding::bytes::{read_i32, read_slice, read_u8};
use crate::pax::schemes::{self, Scheme};
use crate::pax::stats::CompressStats;
use crate::records::codec::RowCodec;
use crate::records::record::{Record, WritableRecord};
use crate::records::registry::CodecRegistry;
use crate::types::{RecordType, Value};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct PaxHeader {
    type_tag: U16,
    num_fields: U16,
    num_records: I32,
}

const _: () = assert!(std::mem::size_of::<PaxHeader>() == PAX_HEADER_SIZE);

impl PaxHeader {
    pub fn new(num_fields: u16, num_records: i32) -> Self {
        Self {
            type_tag: U16::new(PAX_TYPE_TAG),
            num_fields: U16::new(num_fields),
            num_records: I32::new(num_records),
        }
    }

    pub fn from_bytes(buf: &[u8]) -> Result<&Self> {
        let bytes = read_slice(buf, 0, PAX_HEADER_SIZE, "PAX header")?;
        let header = Self::ref_from_bytes(bytes)
            .map_err(|e| eyre::eyre!("failed to parse PaxHeader: {:?}", e))?;
        ensure!(
            header.type_tag() == PAX_TYPE_TAG,
            "not a PAX batch: type tag {:#06x}",
            header.type_tag()
        );
        ensure!(
            header.num_records() >= 0,
            "negative PAX record count: {}",
            header.num_records()
        );
        Ok(header)
    }

    be_accessors! {
        type_tag: u16,
        num_fields: u16,
        num_records: i32,
    }
}

/// What the encoder chose for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReport {
    pub field_id: u16,
    pub field_name: String,
    pub scheme: Scheme,
    /// Payload bytes written by the scheme.
    pub payload_size: usize,
    /// Total column bytes: tag, null bitmap and payload.
    pub column_size: usize,
    pub null_count: usize,
}

#[derive(Debug, Clone)]
pub struct PaxEncoder {
    codec: Arc<RowCodec>,
}

impl PaxEncoder {
    pub fn new(record_type: &Arc<RecordType>) -> Result<Self> {
        Ok(Self::with_codec(CodecRegistry::global().codec_for(record_type)?))
    }

    pub fn with_codec(codec: Arc<RowCodec>) -> Self {
        Self { codec }
    }

    pub fn encode<R: Record>(&self, records: &mut [R]) -> Result<Vec<u8>> {
        Ok(self.encode_with_report(records)?.0)
    }

    pub fn encode_with_report<R: Record>(
        &self,
        records: &mut [R],
    ) -> Result<(Vec<u8>, Vec<ColumnReport>)> {
        let record_type = self.codec.record_type();
        for record in records.iter() {
            ensure!(
                Arc::ptr_eq(record.record_type(), record_type),
                "PAX batch of '{}' cannot hold a record of another '{}' type",
                record_type.name(),
                record.record_type().name()
            );
        }
        ensure!(
            records.len() <= i32::MAX as usize,
            "PAX batch of {} records exceeds the i32 record count",
            records.len()
        );

        let num_fields = self.codec.field_count();
        let mut out = Vec::new();
        out.extend_from_slice(PaxHeader::new(num_fields as u16, records.len() as i32).as_bytes());

        let mut offsets = Vec::with_capacity(num_fields);
        let mut reports = Vec::with_capacity(num_fields);
        for (idx, field) in record_type.fields().iter().enumerate() {
            let column = records
                .iter_mut()
                .map(|r| r.get_value(field.id()))
                .collect::<Result<Vec<_>>>()?;

            let start = out.len();
            offsets.push(start);
            let (scheme, payload_size, null_count) = self.write_column(idx, &column, &mut out)?;
            debug!(
                record_type = record_type.name(),
                field = field.name(),
                scheme = scheme.name(),
                payload_size,
                null_count,
                "encoded PAX column"
            );
            reports.push(ColumnReport {
                field_id: field.id(),
                field_name: field.name().to_string(),
                scheme,
                payload_size,
                column_size: out.len() - start,
                null_count,
            });
        }

        for offset in offsets {
            ensure!(
                offset <= i32::MAX as usize,
                "PAX column offset {} exceeds the i32 footer",
                offset
            );
            out.extend_from_slice(&(offset as i32).to_be_bytes());
        }
        Ok((out, reports))
    }

    fn write_column(
        &self,
        idx: usize,
        column: &[Value],
        out: &mut Vec<u8>,
    ) -> Result<(Scheme, usize, usize)> {
        let op = self.codec.operator_at(idx);
        if let Some(invalid) = column.iter().find(|v| !v.is_null() && !op.is_valid(v)) {
            let field = &self.codec.record_type().fields()[idx];
            return Err(CodecError::TypeMismatch {
                id: field.id(),
                expected: field.field_type().to_string(),
                actual: invalid.kind_name(),
            }
            .into());
        }
        let null_count = column.iter().filter(|v| v.is_null()).count();
        let stats = CompressStats::new(
            op,
            self.codec.options(),
            column.iter().filter(|v| !v.is_null()),
        );
        let (scheme, estimate) = schemes::select(&stats);

        if null_count > 0 {
            out.push(scheme.tag() | NULLABLE_COLUMN_FLAG);
            out.extend_from_slice(&from_predicate(column, Value::is_null));
        } else {
            out.push(scheme.tag());
        }
        let payload_start = out.len();
        scheme.encode(&stats, out)?;
        let payload_size = out.len() - payload_start;
        ensure!(
            payload_size == estimate,
            "{} payload of {} bytes differs from its {}-byte estimate",
            scheme,
            payload_size,
            estimate
        );
        Ok((scheme, payload_size, null_count))
    }
}

/// Borrowed reader over an encoded PAX batch.
#[derive(Debug)]
pub struct PaxView<'a> {
    buf: &'a [u8],
    codec: Arc<RowCodec>,
    num_records: usize,
    offsets: Vec<usize>,
    footer_start: usize,
}

impl<'a> PaxView<'a> {
    pub fn new(record_type: &Arc<RecordType>, buf: &'a [u8]) -> Result<Self> {
        Self::with_codec(CodecRegistry::global().codec_for(record_type)?, buf)
    }

    pub fn with_codec(codec: Arc<RowCodec>, buf: &'a [u8]) -> Result<Self> {
        let header = PaxHeader::from_bytes(buf)?;
        let num_fields = header.num_fields() as usize;
        ensure!(
            num_fields == codec.field_count(),
            "PAX batch has {} columns, '{}' has {} fields",
            num_fields,
            codec.record_type().name(),
            codec.field_count()
        );

        let footer_len = num_fields * PAX_FOOTER_ENTRY_SIZE;
        ensure!(
            buf.len() >= PAX_HEADER_SIZE + footer_len,
            "PAX batch of {} bytes is too short for its {}-column footer",
            buf.len(),
            num_fields
        );
        let footer_start = buf.len() - footer_len;

        let mut offsets: Vec<usize> = Vec::with_capacity(num_fields);
        for i in 0..num_fields {
            let offset = read_i32(buf, footer_start + i * PAX_FOOTER_ENTRY_SIZE)?;
            // every column holds at least its tag byte
            let in_order = match offsets.last() {
                None => offset as usize == PAX_HEADER_SIZE,
                Some(&previous) => offset >= 0 && offset as usize > previous,
            };
            ensure!(
                in_order && (offset as usize) < footer_start,
                "PAX column {} offset {} is out of order or out of bounds",
                i,
                offset
            );
            offsets.push(offset as usize);
        }

        // a column packs at most MAX_RUN_LENGTH records into each byte
        let num_records = header.num_records() as usize;
        ensure!(
            num_fields == 0 || num_records <= (footer_start - PAX_HEADER_SIZE) * MAX_RUN_LENGTH,
            "PAX batch claims {} records but holds only {} column bytes",
            num_records,
            footer_start - PAX_HEADER_SIZE
        );

        Ok(Self {
            buf,
            codec,
            num_records,
            offsets,
            footer_start,
        })
    }

    pub fn num_records(&self) -> usize {
        self.num_records
    }

    pub fn num_fields(&self) -> usize {
        self.offsets.len()
    }

    /// Absolute offset of the column of field `id`.
    pub fn column_offset(&self, id: u16) -> Result<usize> {
        let idx = self.field_idx(id)?;
        Ok(self.offsets[idx])
    }

    fn field_idx(&self, id: u16) -> Result<usize> {
        self.codec.record_type().require_field(id)?;
        Ok(id as usize - 1)
    }

    fn column_end(&self, idx: usize) -> usize {
        self.offsets
            .get(idx + 1)
            .copied()
            .unwrap_or(self.footer_start)
    }

    /// Scheme of the column of field `id` and whether it carries a null bitmap.
    pub fn column_scheme(&self, id: u16) -> Result<(Scheme, bool)> {
        let idx = self.field_idx(id)?;
        let tag = read_u8(self.buf, self.offsets[idx])?;
        let scheme = Scheme::try_from(tag & !NULLABLE_COLUMN_FLAG)?;
        Ok((scheme, tag & NULLABLE_COLUMN_FLAG != 0))
    }

    /// Every value of the column of field `id`, in record order.
    pub fn decode_column(&self, id: u16) -> Result<Vec<Value>> {
        let idx = self.field_idx(id)?;
        let (scheme, nullable) = self.column_scheme(id)?;
        let start = self.offsets[idx];
        let end = self.column_end(idx);
        let column = &self.buf[..end];
        let op = self.codec.operator_at(idx);

        let mut cursor = start + 1;
        let values = if nullable {
            let bitmap = read_slice(column, cursor, bitmap_len(self.num_records), "null bitmap")?;
            cursor += bitmap.len();
            let nulls = (0..self.num_records).filter(|&row| is_set(bitmap, row)).count();
            let (present, used) = scheme.decode(column, cursor, self.num_records - nulls, op)?;
            cursor += used;

            let mut present = present.into_iter();
            let mut values = Vec::with_capacity(self.num_records);
            for row in 0..self.num_records {
                if is_set(bitmap, row) {
                    values.push(Value::Null);
                } else {
                    let value = present
                        .next()
                        .ok_or_else(|| eyre::eyre!("column {} ran out of values", id))?;
                    values.push(value);
                }
            }
            values
        } else {
            let (values, used) = scheme.decode(column, cursor, self.num_records, op)?;
            cursor += used;
            values
        };

        if self.codec.options().validates_on_decode() {
            ensure!(
                cursor == end,
                "column {} decoded {} bytes of its {}",
                id,
                cursor - start,
                end - start
            );
        }
        Ok(values)
    }

    /// Materialises every record of the batch.
    pub fn records(&self) -> Result<Vec<WritableRecord>> {
        let columns = self
            .codec
            .record_type()
            .fields()
            .iter()
            .map(|field| self.decode_column(field.id()))
            .collect::<Result<Vec<_>>>()?;

        let mut records: Vec<WritableRecord> = (0..self.num_records)
            .map(|_| WritableRecord::with_codec(self.codec.clone()))
            .collect();
        for (field, column) in self.codec.record_type().fields().iter().zip(columns) {
            for (record, value) in records.iter_mut().zip(column) {
                record.set_value(field.id(), value)?;
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldDescriptor, FieldType, PrimitiveKind};

    fn metric() -> Arc<RecordType> {
        RecordType::new(
            "metric",
            vec![
                FieldDescriptor::new(1, "host", FieldType::primitive(PrimitiveKind::String)),
                FieldDescriptor::new(2, "cpu", FieldType::primitive(PrimitiveKind::Int32)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn header_layout() {
        let header = PaxHeader::new(3, 1000);
        assert_eq!(header.as_bytes(), &[0xFF, 0xFF, 0, 3, 0, 0, 0x03, 0xE8]);
        assert_eq!(PaxHeader::from_bytes(header.as_bytes()).unwrap().num_records(), 1000);
    }

    #[test]
    fn wrong_type_tag_is_rejected() {
        let buf = [0x00, 0x01, 0, 0, 0, 0, 0, 0];
        assert!(PaxHeader::from_bytes(&buf).is_err());
    }

    #[test]
    fn empty_batch_roundtrips() {
        let t = metric();
        let encoder = PaxEncoder::new(&t).unwrap();
        let bytes = encoder.encode::<WritableRecord>(&mut []).unwrap();
        let view = PaxView::new(&t, &bytes).unwrap();
        assert_eq!(view.num_records(), 0);
        assert_eq!(view.decode_column(1).unwrap(), Vec::<Value>::new());
        assert!(view.records().unwrap().is_empty());
    }

    #[test]
    fn nullable_column_sets_flag() {
        let t = metric();
        let mut records: Vec<WritableRecord> = (0..4)
            .map(|i| {
                let mut r = WritableRecord::new(&t).unwrap();
                if i % 2 == 0 {
                    r.set_value(1, Value::from("db-1")).unwrap();
                }
                r.set_value(2, Value::Int32(i)).unwrap();
                r
            })
            .collect();
        let (bytes, reports) = PaxEncoder::new(&t)
            .unwrap()
            .encode_with_report(&mut records)
            .unwrap();
        assert_eq!(reports[0].null_count, 2);
        assert_eq!(reports[1].null_count, 0);

        let view = PaxView::new(&t, &bytes).unwrap();
        assert!(view.column_scheme(1).unwrap().1);
        assert!(!view.column_scheme(2).unwrap().1);
        assert_eq!(
            view.decode_column(1).unwrap(),
            vec![Value::from("db-1"), Value::Null, Value::from("db-1"), Value::Null]
        );
    }

    #[test]
    fn mixed_record_types_are_rejected() {
        let t = metric();
        let other = RecordType::new(
            "other",
            vec![FieldDescriptor::new(1, "x", FieldType::primitive(PrimitiveKind::Int32))],
        )
        .unwrap();
        let mut records = vec![
            WritableRecord::new(&t).unwrap(),
            WritableRecord::new(&other).unwrap(),
        ];
        assert!(PaxEncoder::new(&t).unwrap().encode(&mut records).is_err());
    }

    fn single(name: &str, kind: PrimitiveKind) -> Arc<RecordType> {
        RecordType::new(
            name,
            vec![FieldDescriptor::new(1, "v", FieldType::primitive(kind))],
        )
        .unwrap()
    }

    #[test]
    fn same_name_different_type_is_rejected() {
        let ints = single("shadowed", PrimitiveKind::Int32);
        let strings = single("shadowed", PrimitiveKind::String);
        let mut record = WritableRecord::new(&strings).unwrap();
        record.set_value(1, Value::from("hi")).unwrap();

        let encoder = PaxEncoder::new(&ints).unwrap();
        assert!(encoder.encode(&mut [record]).is_err());
    }

    /// Hands out whatever values it was built with, valid or not.
    struct Loose {
        record_type: Arc<RecordType>,
        values: Vec<Value>,
    }

    impl Record for Loose {
        fn record_type(&self) -> &Arc<RecordType> {
            &self.record_type
        }

        fn get_value(&mut self, id: u16) -> Result<Value> {
            Ok(self.values[id as usize - 1].clone())
        }

        fn set_value(&mut self, id: u16, value: Value) -> Result<()> {
            self.values[id as usize - 1] = value;
            Ok(())
        }

        fn list_size(&mut self, _id: u16) -> Result<usize> {
            Ok(0)
        }

        fn to_bytes(&mut self) -> Result<Vec<u8>> {
            eyre::bail!("not encodable")
        }
    }

    #[test]
    fn mistyped_column_value_is_rejected() {
        let t = metric();
        let mut records = vec![
            Loose {
                record_type: t.clone(),
                values: vec![Value::from("db-1"), Value::Int32(1)],
            },
            Loose {
                record_type: t.clone(),
                values: vec![Value::from("db-2"), Value::from("oops")],
            },
        ];
        let err = PaxEncoder::new(&t).unwrap().encode(&mut records).unwrap_err();
        assert!(matches!(
            CodecError::of(&err),
            Some(CodecError::TypeMismatch { id: 2, actual: "string", .. })
        ));
    }

    fn encoded_metric(t: &Arc<RecordType>) -> Vec<u8> {
        let mut records: Vec<WritableRecord> = (0..3)
            .map(|i| {
                let mut r = WritableRecord::new(t).unwrap();
                r.set_value(1, Value::from("db-1")).unwrap();
                r.set_value(2, Value::Int32(i)).unwrap();
                r
            })
            .collect();
        PaxEncoder::new(t).unwrap().encode(&mut records).unwrap()
    }

    #[test]
    fn inflated_record_count_is_rejected() {
        let t = metric();
        let mut bytes = encoded_metric(&t);
        bytes[4..8].copy_from_slice(&i32::MAX.to_be_bytes());
        assert!(PaxView::new(&t, &bytes).is_err());

        let mut bare = PaxHeader::new(2, i32::MAX).as_bytes().to_vec();
        bare.extend_from_slice(&[0x03, 0x03]);
        bare.extend_from_slice(&8i32.to_be_bytes());
        bare.extend_from_slice(&9i32.to_be_bytes());
        assert!(PaxView::new(&t, &bare).is_err());
    }

    #[test]
    fn footer_offsets_must_increase() {
        let t = metric();
        let bytes = encoded_metric(&t);
        let footer = bytes.len() - 2 * PAX_FOOTER_ENTRY_SIZE;
        assert!(PaxView::new(&t, &bytes).is_ok());

        let mut shared = bytes.clone();
        let first = shared[footer..footer + 4].to_vec();
        shared[footer + 4..footer + 8].copy_from_slice(&first);
        assert!(PaxView::new(&t, &shared).is_err());

        let mut shifted = bytes.clone();
        shifted[footer..footer + 4].copy_from_slice(&9i32.to_be_bytes());
        assert!(PaxView::new(&t, &shifted).is_err());
    }
}
