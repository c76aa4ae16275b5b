//! # Row Codec
//!
//! `RowCodec` converts between a value array (`[Value]`, indexed by field id
//! - 1) and the packed row format. It holds no per-record state: one codec is
//! built per record type and shared through the `CodecRegistry`.
//!
//! ## Encoding
//!
//! ```text
//! [RecordHeader 6B][reference section][null bitmap][payload 1]...[payload n]
//! ```
//!
//! 1. Write the header and a reference section with every offset set to -1.
//! 2. Reserve the null bitmap.
//! 3. For each persisted field in id order, either set its bitmap bit (absent)
//!    or append its payload and backfill every slot the field owns.
//!
//! A field is absent when its value is NULL, invalid for the declared type, or
//! equal to the field's default. Invalid values are dropped with a debug log
//! rather than failing the encode.
//!
//! ## Decoding
//!
//! Decoding walks the bitmap and reads present payloads back to back. Absent
//! fields come back as their default, or NULL without one. Because payloads
//! are self-delimiting, `scan_offsets` can find every payload position with a
//! single pass that reads only length prefixes.

use std::sync::Arc;

use eyre::{ensure, Result};
use smallvec::SmallVec;
use tracing::debug;
use zerocopy::big_endian::U16;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::{CodecOptions, FORMAT_VERSION, RECORD_HEADER_SIZE};
use crate::encoding::bitmap::{is_set, set_bit};
use crate::encoding::bytes::read_slice;
use crate::records::layout::LayoutMeta;
use crate::records::operator::ValueOperator;
use crate::types::{RecordType, Value};

/// Payload offsets of one record, `ABSENT_SLOT` for absent fields.
pub type OffsetCache = SmallVec<[u32; 16]>;

pub const ABSENT_SLOT: u32 = u32::MAX;

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct RecordHeader {
    version: U16,
    field_count: U16,
    ref_section_len: U16,
}

const _: () = assert!(std::mem::size_of::<RecordHeader>() == RECORD_HEADER_SIZE);

impl RecordHeader {
    pub fn new(field_count: u16, ref_section_len: u16) -> Self {
        Self {
            version: U16::new(FORMAT_VERSION),
            field_count: U16::new(field_count),
            ref_section_len: U16::new(ref_section_len),
        }
    }

    pub fn from_bytes(buf: &[u8]) -> Result<&Self> {
        let bytes = read_slice(buf, 0, RECORD_HEADER_SIZE, "record header")?;
        let header = Self::ref_from_bytes(bytes)
            .map_err(|e| eyre::eyre!("failed to parse RecordHeader: {:?}", e))?;
        ensure!(
            header.version() == FORMAT_VERSION,
            "unsupported record format version: {} (expected {})",
            header.version(),
            FORMAT_VERSION
        );
        Ok(header)
    }

    be_accessors! {
        version: u16,
        field_count: u16,
        ref_section_len: u16,
    }
}

#[derive(Debug)]
pub struct RowCodec {
    record_type: Arc<RecordType>,
    layout: LayoutMeta,
    operators: Vec<ValueOperator>,
    options: CodecOptions,
}

impl RowCodec {
    pub fn new(record_type: Arc<RecordType>, options: CodecOptions) -> Result<Self> {
        Self::nested(record_type, options, 0, "")
    }

    /// Builds the codec of a type reached through `depth` composite levels.
    pub(crate) fn nested(
        record_type: Arc<RecordType>,
        options: CodecOptions,
        depth: usize,
        path: &str,
    ) -> Result<Self> {
        let operators = record_type
            .fields()
            .iter()
            .map(|field| {
                let field_path = if path.is_empty() {
                    format!("{}.{}", record_type.name(), field.name())
                } else {
                    format!("{}.{}", path, field.name())
                };
                ValueOperator::for_type(field.field_type(), depth, &field_path, options)
            })
            .collect::<Result<Vec<_>>>()?;
        let layout = LayoutMeta::new(&record_type);

        Ok(Self {
            record_type,
            layout,
            operators,
            options,
        })
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.record_type
    }

    pub fn layout(&self) -> &LayoutMeta {
        &self.layout
    }

    pub fn options(&self) -> CodecOptions {
        self.options
    }

    /// Operator of the persisted field at `idx`, if there is one.
    pub fn operator(&self, idx: usize) -> Option<&ValueOperator> {
        self.operators.get(idx)
    }

    /// `idx` must come from a field id already resolved against the type.
    pub(crate) fn operator_at(&self, idx: usize) -> &ValueOperator {
        &self.operators[idx]
    }

    pub fn field_count(&self) -> usize {
        self.operators.len()
    }

    /// Whether `value` gets a payload in the field at `idx`.
    pub fn is_present(&self, idx: usize, value: &Value) -> bool {
        if value.is_null() || !self.operators[idx].is_valid(value) {
            return false;
        }
        self.record_type.fields()[idx].default_value() != Some(value)
    }

    /// A nested tuple is valid when it has one slot per field and every
    /// non-null slot matches its field type.
    pub fn is_valid_tuple(&self, values: &[Value]) -> bool {
        values.len() == self.operators.len()
            && values
                .iter()
                .zip(&self.operators)
                .all(|(v, op)| v.is_null() || op.is_valid(v))
    }

    /// Bytes the field at `idx` contributes to the record when set to `value`.
    pub fn value_size(&self, idx: usize, value: &Value) -> usize {
        if self.is_present(idx, value) {
            self.operators[idx].encoded_len(value, self.options)
        } else {
            0
        }
    }

    /// Size of the fixed part: header, reference section and null bitmap.
    pub fn header_len(&self) -> usize {
        self.layout.header_len()
    }

    /// Exact encoded size of `values` without encoding them.
    pub fn encoded_len(&self, values: &[Value]) -> usize {
        self.header_len()
            + values
                .iter()
                .enumerate()
                .take(self.operators.len())
                .map(|(idx, v)| self.value_size(idx, v))
                .sum::<usize>()
    }

    pub fn encode(&self, values: &[Value]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len(values));
        self.encode_into(values, &mut out)?;
        Ok(out)
    }

    /// Appends the encoded record to `out`. Stored offsets are relative to
    /// the position the record starts at.
    pub fn encode_into(&self, values: &[Value], out: &mut Vec<u8>) -> Result<()> {
        ensure!(
            values.len() == self.operators.len(),
            "record type '{}' has {} fields, got {} values",
            self.record_type.name(),
            self.operators.len(),
            values.len()
        );

        let base = out.len();
        let header = RecordHeader::new(
            self.operators.len() as u16,
            self.layout.reference_section_len() as u16,
        );
        out.extend_from_slice(header.as_bytes());
        self.layout.write_placeholder(out);
        let bitmap_start = out.len();
        out.resize(bitmap_start + self.layout.null_bitmap_len(), 0);

        for (idx, value) in values.iter().enumerate() {
            if !self.is_present(idx, value) {
                if !value.is_null() && !self.operators[idx].is_valid(value) {
                    debug!(
                        record_type = self.record_type.name(),
                        field = self.record_type.fields()[idx].name(),
                        expected = %self.operators[idx].describe(),
                        actual = value.kind_name(),
                        "dropping value that does not match its field type"
                    );
                }
                set_bit(&mut out[bitmap_start..], idx);
                continue;
            }
            let offset = out.len() - base;
            self.operators[idx].write_value(value, out, self.options)?;
            self.layout.backfill(idx, out, base, offset);
        }
        Ok(())
    }

    /// Validates the fixed header against this codec's record type.
    pub fn check_header(&self, buf: &[u8]) -> Result<()> {
        let header = RecordHeader::from_bytes(buf)?;
        ensure!(
            header.field_count() as usize == self.operators.len(),
            "record of '{}' declares {} fields, expected {}",
            self.record_type.name(),
            header.field_count(),
            self.operators.len()
        );
        ensure!(
            header.ref_section_len() as usize == self.layout.reference_section_len(),
            "record of '{}' declares a {}-byte reference section, expected {}",
            self.record_type.name(),
            header.ref_section_len(),
            self.layout.reference_section_len()
        );
        ensure!(
            buf.len() >= self.header_len(),
            "record of '{}' is truncated: {} bytes, header needs {}",
            self.record_type.name(),
            buf.len(),
            self.header_len()
        );
        Ok(())
    }

    fn bitmap<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        let start = self.layout.bitmap_start();
        &buf[start..start + self.layout.null_bitmap_len()]
    }

    pub fn decode(&self, buf: &[u8]) -> Result<Vec<Value>> {
        self.check_header(buf)?;
        let bitmap = self.bitmap(buf);
        let fields = self.record_type.fields();

        let mut values = Vec::with_capacity(self.operators.len());
        let mut cursor = self.header_len();
        for (idx, op) in self.operators.iter().enumerate() {
            if is_set(bitmap, idx) {
                values.push(fields[idx].absent_value());
                continue;
            }
            if self.options.validates_on_decode() && self.layout.is_fast_path(idx) {
                let slot = self.layout.fast_path_offset(idx, buf)?;
                ensure!(
                    slot == Some(cursor),
                    "offset slot of field '{}' is {:?}, payload starts at {}",
                    fields[idx].name(),
                    slot,
                    cursor
                );
            }
            let (value, used) = op.read_value(buf, cursor)?;
            values.push(value);
            cursor += used;
        }

        if self.options.validates_on_decode() {
            ensure!(
                cursor == buf.len(),
                "record of '{}' has {} trailing bytes",
                self.record_type.name(),
                buf.len() - cursor
            );
        }
        Ok(values)
    }

    /// Decodes the field at `idx` from its payload offset. `None` means the
    /// field is absent.
    pub fn decode_field_at(&self, idx: usize, buf: &[u8], offset: Option<usize>) -> Result<Value> {
        let field = self.record_type.fields().get(idx).ok_or_else(|| {
            eyre::eyre!(
                "field index {} out of range for '{}'",
                idx,
                self.record_type.name()
            )
        })?;
        match offset {
            None => Ok(field.absent_value()),
            Some(offset) => Ok(self.operators[idx].read_value(buf, offset)?.0),
        }
    }

    /// One pass over the bitmap and length prefixes collecting every payload
    /// offset.
    pub fn scan_offsets(&self, buf: &[u8]) -> Result<OffsetCache> {
        self.check_header(buf)?;
        let bitmap = self.bitmap(buf);

        let mut offsets = OffsetCache::with_capacity(self.operators.len());
        let mut cursor = self.header_len();
        for (idx, op) in self.operators.iter().enumerate() {
            if is_set(bitmap, idx) {
                offsets.push(ABSENT_SLOT);
                continue;
            }
            offsets.push(cursor as u32);
            cursor += op.skip_len(buf, cursor)?;
        }
        Ok(offsets)
    }

    /// Whether the field at `idx` is marked absent in the bitmap of `buf`.
    pub fn is_absent_in(&self, idx: usize, buf: &[u8]) -> bool {
        is_set(self.bitmap(buf), idx)
    }
}
