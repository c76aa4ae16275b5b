//! # Schema-Driven Records with O(1) Hot-Field Access
//!
//! This module packs one record (a value per persisted field of a
//! `RecordType`) into a compact big-endian buffer and reads it back, either
//! fully or one field at a time.
//!
//! ## Record Binary Layout
//!
//! ```text
//! +-------------+-------------------+-------------+------------------------+
//! | Header (6B) | Reference Section | Null Bitmap | Payloads (id order)    |
//! +-------------+-------------------+-------------+------------------------+
//! ```
//!
//! | Component | Type | Description |
//! |-----------|------|-------------|
//! | **Header** | `u16 x 3` | version, field count, reference section length |
//! | **Reference Section** | varies | payload offsets of the sort key, list and reference fields |
//! | **Null Bitmap** | `[u8; (N+7)/8]` | 1 bit per field, MSB first. `1` = absent |
//! | **Payloads** | `[u8; ...]` | present fields, each with its own length prefix if variable |
//!
//! ## Design Goals
//!
//! 1. **O(1) hot fields**: sort key, list and reference fields are found via a
//!    fixed slot, without touching the rest of the record
//! 2. **Compact absent fields**: NULL and default values cost one bit
//! 3. **Schema-dependent**: types come from the `RecordType`, not stored per row
//! 4. **Bounded nesting**: two levels of group or list below the root
//!
//! ## Module Structure
//!
//! - `operator`: `ValueOperator`, the byte form of one field type
//! - `layout`: `LayoutMeta`, the reference section plan of a record type
//! - `codec`: `RowCodec`, encode and decode of whole records
//! - `registry`: `CodecRegistry`, memoized codecs shared across threads
//! - `record`: the `Record` trait and the owned `WritableRecord`
//! - `view`: `RecordView`, the borrowed read-only record
//! - `compare`: `SortKeyComparator`

pub mod codec;
pub mod compare;
pub mod layout;
pub mod operator;
pub mod record;
pub mod registry;
pub mod view;


pub use codec::{RecordHeader, RowCodec};
pub use compare::SortKeyComparator;
pub use layout::LayoutMeta;
pub use operator::ValueOperator;
pub use record::{Record, WritableRecord};
pub use registry::CodecRegistry;
pub use view::RecordView;
