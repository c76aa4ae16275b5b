//! # rowpax - Schema-Driven Binary Records and PAX Column Batches
//!
//! rowpax packs typed, nested, nullable tuples into compact big-endian byte
//! buffers and reads them back either fully or one field at a time. Batches
//! of records can be transposed into a column-oriented PAX buffer where every
//! column picks the cheapest of four encodings.
//!
//! - **O(1) hot fields**: sort key, list and frequently used fields are found
//!   through a fixed reference section, no full decode needed
//! - **Absent fields cost one bit**: NULLs and default values are elided
//! - **Explicit ownership**: `WritableRecord` owns its bytes, `RecordView`
//!   borrows them read-only
//!
//! ## Quick Start
//!
//! ```ignore
//! use rowpax::records::{Record, RecordView, WritableRecord};
//! use rowpax::types::{FieldDescriptor, FieldType, PrimitiveKind, RecordType, SortOrder, Value};
//!
//! let player = RecordType::new("player", vec![
//!     FieldDescriptor::new(1, "id", FieldType::primitive(PrimitiveKind::Int64))
//!         .required()
//!         .has_reference(),
//!     FieldDescriptor::new(2, "score", FieldType::primitive(PrimitiveKind::Int32))
//!         .required()
//!         .sort_key(SortOrder::Descending),
//!     FieldDescriptor::new(3, "team", FieldType::primitive(PrimitiveKind::String))
//!         .with_default("Unknown"),
//! ])?;
//!
//! let mut record = WritableRecord::new(&player)?;
//! record.set_value(1, Value::Int64(7))?;
//! record.set_value(2, Value::Int32(1200))?;
//! let bytes = record.to_bytes()?;
//!
//! let view = RecordView::new(&player, &bytes)?;
//! assert_eq!(view.get_value(3)?, Value::from("Unknown"));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │    PAX batches (PaxEncoder/View)     │
//! ├─────────────────────────────────────┤
//! │  Records (WritableRecord/RecordView) │
//! ├─────────────────────────────────────┤
//! │  RowCodec + LayoutMeta (registry)    │
//! ├─────────────────────────────────────┤
//! │     ValueOperator per field type     │
//! ├─────────────────────────────────────┤
//! │    Type model (RecordType, Value)    │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`types`]: record types, field descriptors and runtime values
//! - [`records`]: row codec, owned and borrowed records, sort ordering
//! - [`pax`]: column statistics, encoding schemes, batch encoder and reader
//! - [`encoding`]: big-endian readers and MSB-first bitmaps
//! - [`config`]: format constants and `CodecOptions`
//! - [`error`]: `CodecError` kinds carried inside `eyre::Report`

#[macro_use]
mod macros;

pub mod config;
pub mod encoding;
pub mod error;
pub mod pax;
pub mod records;
pub mod types;

pub use config::{CodecOptions, OversizedStringPolicy};
pub use error::CodecError;
pub use pax::{PaxEncoder, PaxView, Scheme};
pub use records::{CodecRegistry, Record, RecordView, RowCodec, WritableRecord};
pub use types::{FieldDescriptor, FieldType, PrimitiveKind, RecordType, SortOrder, Value};
