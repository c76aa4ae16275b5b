//! # Type Model
//!
//! The slice of the schema model the codec consumes: record types as ordered
//! field lists, their field types, and runtime values.
//!
//! ## Module Structure
//!
//! - `field_type`: `PrimitiveKind` and `FieldType`
//! - `field`: `FieldDescriptor`, `FieldFlags`, `SortOrder`
//! - `record_type`: `RecordType`, the validated field list of one record type
//! - `value`: `Value`, the boxed form of one field value
//!
//! ## Usage
//!
//! ```ignore
//! use rowpax::types::{FieldDescriptor, FieldType, PrimitiveKind, RecordType};
//!
//! let person = RecordType::new("person", vec![
//!     FieldDescriptor::new(1, "id", FieldType::primitive(PrimitiveKind::Int64)).required(),
//!     FieldDescriptor::new(2, "name", FieldType::primitive(PrimitiveKind::String)),
//! ])?;
//! ```

mod field;
mod field_type;
mod record_type;
mod value;

pub use field::{FieldDescriptor, FieldFlags, SortOrder};
pub use field_type::{FieldType, PrimitiveKind};
pub use record_type::RecordType;
pub use value::Value;
