//! # Codec Options
//!
//! Behaviour switches attached to a `RowCodec` when it is created by a
//! `CodecRegistry`. Options are fixed for the lifetime of the codec so every
//! record of a type encodes the same way.
//!
//! ```ignore
//! let options = CodecOptions::default()
//!     .oversized_strings(OversizedStringPolicy::WriteEmpty)
//!     .validate_on_decode(false);
//! let registry = CodecRegistry::with_options(options);
//! ```

/// What the encoder does with a string longer than `MAX_STRING_BYTES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OversizedStringPolicy {
    /// Fail the encode with `CodecError::StringTooLong`.
    #[default]
    Reject,
    /// Log a warning and write a zero-length string instead. Loses data.
    WriteEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    oversized_strings: OversizedStringPolicy,
    validate_on_decode: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            oversized_strings: OversizedStringPolicy::Reject,
            validate_on_decode: true,
        }
    }
}

impl CodecOptions {
    pub fn oversized_strings(mut self, policy: OversizedStringPolicy) -> Self {
        self.oversized_strings = policy;
        self
    }

    /// When set, decoding checks the header version and field count against
    /// the record type before reading any payload.
    pub fn validate_on_decode(mut self, enabled: bool) -> Self {
        self.validate_on_decode = enabled;
        self
    }

    pub fn oversized_string_policy(&self) -> OversizedStringPolicy {
        self.oversized_strings
    }

    pub fn validates_on_decode(&self) -> bool {
        self.validate_on_decode
    }
}
