//! # PAX Column Batches
//!
//! Transposes a batch of records of one type into per-field columns and
//! compresses each column independently.
//!
//! ## Module Structure
//!
//! - `stats`: `CompressStats`, per-column statistics driving scheme choice
//! - `schemes`: the four column encodings and the selector
//! - `batch`: `PaxEncoder`, `PaxView` and the `PaxHeader`
//!
//! ## Usage
//!
//! ```ignore
//! let encoder = PaxEncoder::new(&metric)?;
//! let (bytes, report) = encoder.encode_with_report(&mut records)?;
//!
//! let view = PaxView::new(&metric, &bytes)?;
//! let hosts = view.decode_column(1)?;
//! let records = view.records()?;
//! ```

pub mod batch;
pub mod schemes;
pub mod stats;

pub use batch::{ColumnReport, PaxEncoder, PaxHeader, PaxView};
pub use schemes::Scheme;
pub use stats::CompressStats;
