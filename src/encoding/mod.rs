//! # Encoding Module
//!
//! Low-level helpers shared by the row codec and the PAX column schemes:
//!
//! - **Big-endian readers**: bounds-checked fixed-width integer reads
//! - **Bitmaps**: MSB-first bit packing for null and common-value bitmaps

pub mod bitmap;
pub mod bytes;

pub use bitmap::{bitmap_len, is_set, set_bit};
