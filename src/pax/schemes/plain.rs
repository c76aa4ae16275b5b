//! NoCompression: every value in its row form, back to back.

use eyre::Result;

use crate::pax::stats::CompressStats;
use crate::records::operator::ValueOperator;
use crate::types::Value;

pub fn estimate(stats: &CompressStats<'_>) -> usize {
    stats.total_size()
}

pub fn encode(stats: &CompressStats<'_>, out: &mut Vec<u8>) -> Result<()> {
    for value in stats.values() {
        stats
            .operator()
            .write_value(value, out, stats.options())?;
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
    for _ in 0..count {
        let (value, used) = op.read_value(buf, cursor)?;
        values.push(value);
        cursor += used;
    }
    Ok((values, cursor - offset))
}
