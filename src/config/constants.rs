//! # Format Constants
//!
//! This module centralizes every numeric constant of the row and PAX formats.
//! Values that depend on each other are co-located so a change to one is made
//! next to the values it constrains.
//!
//! ## Dependency Graph
//!
//! ```text
//! RECORD_HEADER_SIZE (6 bytes: version, field count, ref section length)
//!       │
//!       └─> header_len = RECORD_HEADER_SIZE + ref section + null bitmap
//!
//! MAX_STRING_BYTES (32767)
//!       │
//!       └─> STRING_LENGTH_PREFIX (u16). Lengths above i16::MAX are never
//!           written so the prefix also reads back as a non-negative i16.
//!
//! MAX_RUN_LENGTH (256)
//!       │
//!       └─> RUN_LENGTH_BIAS (129): the stored byte is `len - 129`, mapping
//!           [1, 256] onto [-128, 127].
//!
//! MAX_DICTIONARY_SIZE (65536)
//!       │
//!       ├─> DICTIONARY_SIZE_BIAS (32769): stored as i16 `size - 32769`
//!       │
//!       └─> SMALL_DICTIONARY_SIZE (256): 1-byte indices up to this size,
//!           2-byte indices above it
//! ```
//!
//! ## Critical Invariants
//!
//! Enforced by compile-time assertions:
//!
//! 1. `MAX_RUN_LENGTH - RUN_LENGTH_BIAS == i8::MAX`
//! 2. `MAX_DICTIONARY_SIZE - DICTIONARY_SIZE_BIAS == i16::MAX`
//! 3. `MAX_STRING_BYTES <= i16::MAX`

// ============================================================================
// ROW FORMAT
// ============================================================================

/// Version written into every record header.
pub const FORMAT_VERSION: u16 = 1;

/// `[version:u16][field_count:u16][ref_section_len:u16]`.
pub const RECORD_HEADER_SIZE: usize = 6;

/// Bytes of a payload offset slot in the reference section.
pub const OFFSET_SLOT_SIZE: usize = 4;

/// Bytes of a field id in a reference-field entry.
pub const FIELD_ID_SIZE: usize = 2;

/// Bytes of the count prefix for the collection and reference-field groups.
pub const GROUP_COUNT_SIZE: usize = 1;

/// Offset stored in a reference-section slot whose field is absent.
pub const ABSENT_OFFSET: i32 = -1;

/// Largest number of collection or reference fields a single count byte holds.
pub const MAX_REFERENCE_GROUP_LEN: usize = u8::MAX as usize;

/// Largest encodable UTF-8 string payload.
pub const MAX_STRING_BYTES: usize = 32767;

/// Length prefix of a string payload.
pub const STRING_LENGTH_PREFIX: usize = 2;

/// Length prefix of binary, group and list payloads.
pub const BLOB_LENGTH_PREFIX: usize = 4;

/// Count prefix of a list payload.
pub const LIST_COUNT_PREFIX: usize = 4;

/// Composite levels (group or list) allowed below a root record.
pub const MAX_NESTING_DEPTH: usize = 2;

const _: () = assert!(
    MAX_STRING_BYTES <= i16::MAX as usize,
    "MAX_STRING_BYTES must fit a non-negative i16 length prefix"
);

// ============================================================================
// PAX BATCH FORMAT
// ============================================================================

/// Type tag at the start of every PAX buffer (-1 as u16).
pub const PAX_TYPE_TAG: u16 = 0xFFFF;

/// `[type_tag:u16][num_fields:u16][num_records:i32]`.
pub const PAX_HEADER_SIZE: usize = 8;

/// Bytes per entry of the column offset footer.
pub const PAX_FOOTER_ENTRY_SIZE: usize = 4;

/// High bit of a column tag: the payload starts with a null bitmap.
pub const NULLABLE_COLUMN_FLAG: u8 = 0x80;

// ============================================================================
// RUN-LENGTH SCHEME
// ============================================================================

/// Longest run a single run byte can express.
pub const MAX_RUN_LENGTH: usize = 256;

/// Bias subtracted from a run length before it is stored as an i8.
pub const RUN_LENGTH_BIAS: i32 = 129;

const _: () = assert!(
    MAX_RUN_LENGTH as i32 - RUN_LENGTH_BIAS == i8::MAX as i32,
    "run length bias must map MAX_RUN_LENGTH onto i8::MAX"
);

const _: () = assert!(
    1 - RUN_LENGTH_BIAS == i8::MIN as i32,
    "run length bias must map a run of one onto i8::MIN"
);

// ============================================================================
// DICTIONARY SCHEME
// ============================================================================

/// Largest dictionary the 2-byte size field can describe.
pub const MAX_DICTIONARY_SIZE: usize = 65536;

/// Bias subtracted from the dictionary size before it is stored as an i16.
pub const DICTIONARY_SIZE_BIAS: i32 = 32769;

/// Dictionaries up to this size use 1-byte indices.
pub const SMALL_DICTIONARY_SIZE: usize = 256;

/// Bias of a 1-byte dictionary index.
pub const SMALL_INDEX_BIAS: i32 = 128;

/// Bias of a 2-byte dictionary index.
pub const LARGE_INDEX_BIAS: i32 = 32768;

const _: () = assert!(
    MAX_DICTIONARY_SIZE as i32 - DICTIONARY_SIZE_BIAS == i16::MAX as i32,
    "dictionary size bias must map MAX_DICTIONARY_SIZE onto i16::MAX"
);

const _: () = assert!(
    SMALL_DICTIONARY_SIZE as i32 - 1 - SMALL_INDEX_BIAS == i8::MAX as i32,
    "small index bias must fit the last small-dictionary index in an i8"
);

/// Estimate returned by a scheme that must not be chosen.
pub const DISQUALIFIED: usize = usize::MAX;
