//! # Configuration Module
//!
//! Format constants live in [`constants`]; per-codec behaviour switches live
//! in [`options`]. Constants are grouped by the format they belong to and
//! their interdependencies are checked at compile time.

pub mod constants;
pub mod options;

pub use constants::*;
pub use options::{CodecOptions, OversizedStringPolicy};
