//! # Column Encoding Schemes
//!
//! Each PAX column is stored with one of four schemes, identified by the tag
//! byte that starts the column.
//!
//! | Scheme | Tag | Payload |
//! |--------|-----|---------|
//! | RunLength | 0 | `[run byte = len - 129][value]` per run of 1..=256 |
//! | Dictionary | 1 | `[i16 size - 32769][distinct values][index per row]` |
//! | CommonValue | 2 | `[bitmap][common value][other values]` |
//! | NoCompression | 3 | every value in row form |
//!
//! ## Selection
//!
//! The encoder evaluates schemes in `SELECTION_ORDER` and keeps a candidate
//! only when its estimate is strictly smaller than the best so far, so ties
//! go to the earlier scheme. A scheme that cannot encode a column estimates
//! `DISQUALIFIED` (`usize::MAX`) and is never chosen.
//!
//! Estimates are exact: the payload `encode` writes is always
//! `estimated_size` bytes long.

pub mod common_value;
pub mod dictionary;
pub mod plain;
pub mod run_length;

use eyre::Result;

use crate::pax::stats::CompressStats;
use crate::records::operator::ValueOperator;
use crate::types::Value;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    RunLength = 0,
    Dictionary = 1,
    CommonValue = 2,
    NoCompression = 3,
}

impl Scheme {
    pub const SELECTION_ORDER: [Scheme; 4] = [
        Scheme::NoCompression,
        Scheme::RunLength,
        Scheme::Dictionary,
        Scheme::CommonValue,
    ];

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Scheme::RunLength => "run_length",
            Scheme::Dictionary => "dictionary",
            Scheme::CommonValue => "common_value",
            Scheme::NoCompression => "no_compression",
        }
    }

    pub fn estimated_size(self, stats: &CompressStats<'_>) -> usize {
        match self {
            Scheme::RunLength => run_length::estimate(stats),
            Scheme::Dictionary => dictionary::estimate(stats),
            Scheme::CommonValue => common_value::estimate(stats),
            Scheme::NoCompression => plain::estimate(stats),
        }
    }

    /// Appends the payload for the column described by `stats`.
    pub fn encode(self, stats: &CompressStats<'_>, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Scheme::RunLength => run_length::encode(stats, out),
            Scheme::Dictionary => dictionary::encode(stats, out),
            Scheme::CommonValue => common_value::encode(stats, out),
            Scheme::NoCompression => plain::encode(stats, out),
        }
    }

    /// Reads `count` values starting at `offset`; returns them and the
    /// bytes consumed.
    pub fn decode(
        self,
        buf: &[u8],
        offset: usize,
        count: usize,
        op: &ValueOperator,
    ) -> Result<(Vec<Value>, usize)> {
        match self {
            Scheme::RunLength => run_length::decode(buf, offset, count, op),
            Scheme::Dictionary => dictionary::decode(buf, offset, count, op),
            Scheme::CommonValue => common_value::decode(buf, offset, count, op),
            Scheme::NoCompression => plain::decode(buf, offset, count, op),
        }
    }
}

impl TryFrom<u8> for Scheme {
    type Error = eyre::Report;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Scheme::RunLength),
            1 => Ok(Scheme::Dictionary),
            2 => Ok(Scheme::CommonValue),
            3 => Ok(Scheme::NoCompression),
            _ => eyre::bail!("unknown column scheme tag: {}", tag),
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Picks the scheme with the strictly smallest estimate, earlier schemes
/// winning ties.
pub fn select(stats: &CompressStats<'_>) -> (Scheme, usize) {
    let mut best = Scheme::NoCompression;
    let mut best_size = usize::MAX;
    for scheme in Scheme::SELECTION_ORDER {
        let estimate = scheme.estimated_size(stats);
        if estimate < best_size {
            best = scheme;
            best_size = estimate;
        }
    }
    (best, best_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CodecOptions, DISQUALIFIED};
    use crate::types::PrimitiveKind;

    #[test]
    fn tags_roundtrip() {
        for scheme in Scheme::SELECTION_ORDER {
            assert_eq!(Scheme::try_from(scheme.tag()).unwrap(), scheme);
        }
        assert!(Scheme::try_from(4).is_err());
    }

    #[test]
    fn identical_values_pick_run_length() {
        let op = ValueOperator::Primitive(PrimitiveKind::Int32);
        let column = vec![Value::Int32(11); 8];
        let stats = CompressStats::new(&op, CodecOptions::default(), &column);

        assert_eq!(Scheme::NoCompression.estimated_size(&stats), 32);
        assert_eq!(Scheme::RunLength.estimated_size(&stats), 5);
        assert_eq!(Scheme::CommonValue.estimated_size(&stats), 5);
        assert_eq!(select(&stats), (Scheme::RunLength, 5));
    }

    #[test]
    fn distinct_floats_stay_uncompressed() {
        let op = ValueOperator::Primitive(PrimitiveKind::Float);
        let column: Vec<Value> = (0..10).map(|i| Value::Float(i as f32 * 0.5)).collect();
        let stats = CompressStats::new(&op, CodecOptions::default(), &column);

        assert_eq!(Scheme::Dictionary.estimated_size(&stats), DISQUALIFIED);
        assert_eq!(select(&stats), (Scheme::NoCompression, 40));
    }

    #[test]
    fn estimates_match_encoded_sizes() {
        let op = ValueOperator::Primitive(PrimitiveKind::String);
        let column: Vec<Value> = ["a", "bb", "a", "a", "ccc", "a", "bb"]
            .iter()
            .map(|s| Value::from(*s))
            .collect();
        let stats = CompressStats::new(&op, CodecOptions::default(), &column);
        for scheme in Scheme::SELECTION_ORDER {
            let mut out = Vec::new();
            scheme.encode(&stats, &mut out).unwrap();
            assert_eq!(out.len(), scheme.estimated_size(&stats), "{}", scheme);
            let (decoded, used) = scheme.decode(&out, 0, column.len(), &op).unwrap();
            assert_eq!(decoded, column, "{}", scheme);
            assert_eq!(used, out.len(), "{}", scheme);
        }
    }
}
