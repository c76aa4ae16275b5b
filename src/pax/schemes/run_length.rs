//! # RunLength
//!
//! ```text
//! [run byte][value] [run byte][value] ...
//! run byte = run length - 129, as i8
//! ```
//!
//! A run holds 1 to 256 equal values. A longer stretch of equal values is
//! written as consecutive runs: 257 equal values become a 256-run followed by
//! a 1-run. Each run writes its true length.

use eyre::{ensure, Result};

use crate::config::{MAX_RUN_LENGTH, RUN_LENGTH_BIAS};
use crate::encoding::bytes::read_i8;
use crate::pax::stats::CompressStats;
use crate::records::operator::ValueOperator;
use crate::types::Value;

pub fn estimate(stats: &CompressStats<'_>) -> usize {
    stats.run_length_size()
}

fn run_byte(len: usize) -> u8 {
    (len as i32 - RUN_LENGTH_BIAS) as i8 as u8
}

pub fn encode(stats: &CompressStats<'_>, out: &mut Vec<u8>) -> Result<()> {
    let op = stats.operator();
    let values = stats.values();
    let mut start = 0;
    while start < values.len() {
        let value = values[start];
        let mut len = 1;
        while start + len < values.len() && len < MAX_RUN_LENGTH && values[start + len] == value
        {
            len += 1;
        }
        out.push(run_byte(len));
        op.write_value(value, out, stats.options())?;
        start += len;
    }
    Ok(())
}

pub fn decode(
    buf: &[u8],
    offset: usize,
    count: usize,
    op: &ValueOperator,
) -> Result<(Vec<Value>, usize)> {
    let mut values = Vec::with_capacity(count.min(buf.len()));
    let mut cursor = offset;
    while values.len() < count {
        let len = (read_i8(buf, cursor)? as i32 + RUN_LENGTH_BIAS) as usize;
        cursor += 1;
        ensure!(
            values.len() + len <= count,
            "run of {} at offset {} overruns the column of {} values",
            len,
            cursor - 1,
            count
        );
        let (value, used) = op.read_value(buf, cursor)?;
        cursor += used;
        values.extend(std::iter::repeat(value).take(len));
    }
    Ok((values, cursor - offset))
}
