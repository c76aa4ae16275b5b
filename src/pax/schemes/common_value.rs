//! # CommonValue
//!
//! ```text
//! [bitmap, 1 bit per row, 1 = common value][common value][other values in row order]
//! ```
//!
//! The common value is the column's most frequent value; it is written once
//! and every row equal to it costs one bit.

use eyre::Result;

use crate::config::DISQUALIFIED;
use crate::encoding::bitmap::{bitmap_len, from_predicate, is_set};
use crate::encoding::bytes::read_slice;
use crate::error::CodecError;
use crate::pax::stats::CompressStats;
use crate::records::operator::ValueOperator;
use crate::types::Value;

pub fn estimate(stats: &CompressStats<'_>) -> usize {
    match stats.most_frequent() {
        Some((common, freq)) => {
            let common_size = stats.value_size(common);
            bitmap_len(stats.len()) + common_size + (stats.total_size() - freq * common_size)
        }
        None => DISQUALIFIED,
    }
}

pub fn encode(stats: &CompressStats<'_>, out: &mut Vec<u8>) -> Result<()> {
    let Some((common, _)) = stats.most_frequent() else {
        return Err(CodecError::SchemeNotApplicable {
            scheme: "common_value",
            reason: "column has no values".to_string(),
        }
        .into());
    };

    let values = stats.values();
    out.extend_from_slice(&from_predicate(values, |v| *v == common));

    let op = stats.operator();
    op.write_value(common, out, stats.options())?;
    for value in values.iter().filter(|v| **v != common) {
        op.write_value(value, out, stats.options())?;
    }
    Ok(())
}

pub fn decode(
    buf: &[u8],
    offset: usize,
    count: usize,
    op: &ValueOperator,
) -> Result<(Vec<Value>, usize)> {
    let bitmap = read_slice(buf, offset, bitmap_len(count), "common value bitmap")?;
    let mut cursor = offset + bitmap.len();

    let (common, used) = op.read_value(buf, cursor)?;
    cursor += used;

    let mut values = Vec::with_capacity(count);
    for row in 0..count {
        if is_set(bitmap, row) {
            values.push(common.clone());
        } else {
            let (value, used) = op.read_value(buf, cursor)?;
            values.push(value);
            cursor += used;
        }
    }
    Ok((values, cursor - offset))
}
