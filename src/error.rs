//! # Codec Error Kinds
//!
//! Every fallible operation in the crate returns `eyre::Result`. Conditions a
//! caller may want to branch on are raised as a [`CodecError`] inside the
//! report and can be recovered with `downcast_ref`:
//!
//! ```ignore
//! match view.set_value(1, Value::Int32(7)) {
//!     Err(e) if matches!(e.downcast_ref::<CodecError>(), Some(CodecError::AccessDenied { .. })) => {}
//!     other => other?,
//! }
//! ```
//!
//! Corrupt or truncated buffers are reported with plain `eyre!` messages since
//! there is nothing a caller can do about them beyond surfacing the message.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("record of type '{record_type}' is read-only")]
    AccessDenied { record_type: String },

    #[error("unsupported nesting in '{path}': {reason}")]
    UnsupportedNesting { path: String, reason: &'static str },

    #[error("record type '{record_type}' has no field with id {id}")]
    UnknownField { record_type: String, id: u16 },

    #[error("string of {len} bytes exceeds the {max} byte limit")]
    StringTooLong { len: usize, max: usize },

    #[error("{scheme} encoding is not applicable: {reason}")]
    SchemeNotApplicable {
        scheme: &'static str,
        reason: String,
    },

    #[error("field {id} expects {expected}, got {actual}")]
    TypeMismatch {
        id: u16,
        expected: String,
        actual: &'static str,
    },
}

impl CodecError {
    /// Returns the `CodecError` carried by `report`, if any.
    pub fn of(report: &eyre::Report) -> Option<&CodecError> {
        report.downcast_ref::<CodecError>()
    }
}
