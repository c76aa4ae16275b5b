//! # Read-Only Record Views
//!
//! `RecordView<'a>` borrows an encoded record without copying it. Every
//! mutation fails with `CodecError::AccessDenied`.
//!
//! ## Offset Cache
//!
//! Sort key, reference and list fields are read through their slot in the
//! reference section. The first read of any other field scans the bitmap and
//! length prefixes once and caches every payload offset; later reads of any
//! field index straight into the buffer. The cache lives in a `OnceCell`, so
//! reads take `&self`.

use std::cell::OnceCell;
use std::sync::Arc;

use eyre::Result;
use tracing::trace;

use crate::error::CodecError;
use crate::records::codec::{OffsetCache, RowCodec, ABSENT_SLOT};
use crate::records::record::{Record, WritableRecord};
use crate::records::registry::CodecRegistry;
use crate::types::{RecordType, Value};

#[derive(Debug)]
pub struct RecordView<'a> {
    buf: &'a [u8],
    codec: Arc<RowCodec>,
    offsets: OnceCell<OffsetCache>,
}

impl<'a> RecordView<'a> {
    pub fn new(record_type: &Arc<RecordType>, buf: &'a [u8]) -> Result<Self> {
        Self::with_codec(CodecRegistry::global().codec_for(record_type)?, buf)
    }

    pub fn with_codec(codec: Arc<RowCodec>, buf: &'a [u8]) -> Result<Self> {
        codec.check_header(buf)?;
        Ok(Self {
            buf,
            codec,
            offsets: OnceCell::new(),
        })
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.buf
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        self.codec.record_type()
    }

    /// Whether the general offset scan has run.
    pub fn has_offset_cache(&self) -> bool {
        self.offsets.get().is_some()
    }

    fn offsets(&self) -> Result<&OffsetCache> {
        if let Some(offsets) = self.offsets.get() {
            return Ok(offsets);
        }
        let scanned = self.codec.scan_offsets(self.buf)?;
        Ok(self.offsets.get_or_init(|| scanned))
    }

    fn field_idx(&self, id: u16) -> Result<usize> {
        self.codec.record_type().require_field(id)?;
        Ok(id as usize - 1)
    }

    fn payload_offset(&self, idx: usize) -> Result<Option<usize>> {
        let layout = self.codec.layout();
        if layout.is_fast_path(idx) {
            trace!(field = idx + 1, "reading field through its offset slot");
            return layout.fast_path_offset(idx, self.buf);
        }
        let slot = self.offsets()?[idx];
        Ok((slot != ABSENT_SLOT).then_some(slot as usize))
    }

    pub fn get_value(&self, id: u16) -> Result<Value> {
        let idx = self.field_idx(id)?;
        let offset = self.payload_offset(idx)?;
        self.codec.decode_field_at(idx, self.buf, offset)
    }

    pub fn list_size(&self, id: u16) -> Result<usize> {
        let idx = self.field_idx(id)?;
        match self.codec.layout().collection_field_offset(id, self.buf)? {
            Some(offset) => self.codec.operator_at(idx).read_list_len(self.buf, offset),
            None => Ok(0),
        }
    }

    /// Every persisted field, in id order.
    pub fn values(&self) -> Result<Vec<Value>> {
        self.codec.decode(self.buf)
    }

    pub fn to_owned_record(&self) -> Result<WritableRecord> {
        WritableRecord::from_buffer(self.codec.clone(), self.buf.to_vec())
    }

    fn access_denied(&self) -> eyre::Report {
        CodecError::AccessDenied {
            record_type: self.codec.record_type().name().to_string(),
        }
        .into()
    }
}

impl Record for RecordView<'_> {
    fn record_type(&self) -> &Arc<RecordType> {
        self.codec.record_type()
    }

    fn get_value(&mut self, id: u16) -> Result<Value> {
        RecordView::get_value(self, id)
    }

    fn set_value(&mut self, _id: u16, _value: Value) -> Result<()> {
        Err(self.access_denied())
    }

    fn list_size(&mut self, id: u16) -> Result<usize> {
        RecordView::list_size(self, id)
    }

    fn to_bytes(&mut self) -> Result<Vec<u8>> {
        Ok(self.buf.to_vec())
    }

    fn is_read_only(&self) -> bool {
        true
    }
}
