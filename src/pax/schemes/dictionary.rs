//! # Dictionary
//!
//! ```text
//! [i16 size - 32769][distinct value 0]...[distinct value size-1][index per row]
//! index = i - 128 as one byte when size <= 256, else i - 32768 as two bytes
//! ```
//!
//! Distinct values are stored in first-seen order. Columns of bool, byte,
//! float or double values never use a dictionary, and neither does a column
//! with more than 65536 distinct values or no values at all.

use eyre::{ensure, Result};
use hashbrown::HashMap;

use crate::config::{
    DICTIONARY_SIZE_BIAS, DISQUALIFIED, LARGE_INDEX_BIAS, MAX_DICTIONARY_SIZE,
    SMALL_DICTIONARY_SIZE, SMALL_INDEX_BIAS,
};
use crate::encoding::bytes::{read_i16, read_i8};
use crate::error::CodecError;
use crate::pax::stats::CompressStats;
use crate::records::operator::ValueOperator;
use crate::types::{PrimitiveKind, Value};

/// Why a dictionary cannot encode this column, if it cannot.
pub fn disqualification(stats: &CompressStats<'_>) -> Option<String> {
    if let Some(kind @ (PrimitiveKind::Bool
    | PrimitiveKind::Byte
    | PrimitiveKind::Float
    | PrimitiveKind::Double)) = stats.primitive_kind()
    {
        return Some(format!("{} columns are not dictionary encoded", kind.name()));
    }
    if stats.distinct_count() > MAX_DICTIONARY_SIZE {
        return Some(format!(
            "{} distinct values exceed the dictionary limit of {}",
            stats.distinct_count(),
            MAX_DICTIONARY_SIZE
        ));
    }
    if stats.is_empty() {
        return Some("column has no values".to_string());
    }
    None
}

fn index_width(size: usize) -> usize {
    if size <= SMALL_DICTIONARY_SIZE {
        1
    } else {
        2
    }
}

pub fn estimate(stats: &CompressStats<'_>) -> usize {
    if disqualification(stats).is_some() {
        return DISQUALIFIED;
    }
    2 + stats.distinct_size() + stats.len() * index_width(stats.distinct_count())
}

pub fn encode(stats: &CompressStats<'_>, out: &mut Vec<u8>) -> Result<()> {
    if let Some(reason) = disqualification(stats) {
        return Err(CodecError::SchemeNotApplicable {
            scheme: "dictionary",
            reason,
        }
        .into());
    }

    let distinct = stats.distinct_values();
    let size = distinct.len();
    out.extend_from_slice(&((size as i32 - DICTIONARY_SIZE_BIAS) as i16).to_be_bytes());

    let op = stats.operator();
    let mut indices: HashMap<&Value, usize> = HashMap::with_capacity(size);
    for (i, value) in distinct.iter().enumerate() {
        op.write_value(value, out, stats.options())?;
        indices.insert(*value, i);
    }

    let wide = index_width(size) == 2;
    for value in stats.values() {
        let i = indices[value] as i32;
        if wide {
            out.extend_from_slice(&((i - LARGE_INDEX_BIAS) as i16).to_be_bytes());
        } else {
            out.push((i - SMALL_INDEX_BIAS) as i8 as u8);
        }
    }
    Ok(())
}

pub fn decode(
    buf: &[u8],
    offset: usize,
    count: usize,
    op: &ValueOperator,
) -> Result<(Vec<Value>, usize)> {
    let size = (read_i16(buf, offset)? as i32 + DICTIONARY_SIZE_BIAS) as usize;
    let mut cursor = offset + 2;

    let mut dictionary = Vec::with_capacity(size.min(buf.len()));
    for _ in 0..size {
        let (value, used) = op.read_value(buf, cursor)?;
        dictionary.push(value);
        cursor += used;
    }

    let wide = index_width(size) == 2;
    let mut values = Vec::with_capacity(count.min(buf.len()));
    for _ in 0..count {
        let i = if wide {
            let raw = read_i16(buf, cursor)?;
            cursor += 2;
            (raw as i32 + LARGE_INDEX_BIAS) as usize
        } else {
            let raw = read_i8(buf, cursor)?;
            cursor += 1;
            (raw as i32 + SMALL_INDEX_BIAS) as usize
        };
        ensure!(
            i < size,
            "dictionary index {} out of range for {} entries",
            i,
            size
        );
        values.push(dictionary[i].clone());
    }
    Ok((values, cursor - offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecOptions;

    #[test]
    fn small_dictionary_uses_byte_indices() {
        let op = ValueOperator::Primitive(PrimitiveKind::Int32);
        let column: Vec<Value> = [10, 20, 10, 10].iter().map(|v| Value::Int32(*v)).collect();
        let stats = CompressStats::new(&op, CodecOptions::default(), &column);
        let mut out = Vec::new();
        encode(&stats, &mut out).unwrap();

        // size 2 - 32769 = -32767
        assert_eq!(&out[..2], &(-32767i16).to_be_bytes());
        assert_eq!(&out[2..10], &[0, 0, 0, 10, 0, 0, 0, 20]);
        assert_eq!(&out[10..], &[0x80, 0x81, 0x80, 0x80]);
        assert_eq!(out.len(), estimate(&stats));
    }

    #[test]
    fn large_dictionary_uses_two_byte_indices() {
        let op = ValueOperator::Primitive(PrimitiveKind::Int32);
        let column: Vec<Value> = (0..300).map(Value::Int32).collect();
        let stats = CompressStats::new(&op, CodecOptions::default(), &column);
        assert_eq!(estimate(&stats), 2 + 300 * 4 + 300 * 2);

        let mut out = Vec::new();
        encode(&stats, &mut out).unwrap();
        let (decoded, used) = decode(&out, 0, 300, &op).unwrap();
        assert_eq!(decoded, column);
        assert_eq!(used, out.len());
    }

    #[test]
    fn float_column_is_not_applicable() {
        let op = ValueOperator::Primitive(PrimitiveKind::Float);
        let column = vec![Value::Float(1.0), Value::Float(1.0)];
        let stats = CompressStats::new(&op, CodecOptions::default(), &column);
        assert_eq!(estimate(&stats), DISQUALIFIED);

        let err = encode(&stats, &mut Vec::new()).unwrap_err();
        assert!(matches!(
            CodecError::of(&err),
            Some(CodecError::SchemeNotApplicable {
                scheme: "dictionary",
                ..
            })
        ));
    }

    #[test]
    fn too_many_distinct_values_disqualify() {
        let op = ValueOperator::Primitive(PrimitiveKind::Int32);
        let column: Vec<Value> = (0..70_000).map(Value::Int32).collect();
        let stats = CompressStats::new(&op, CodecOptions::default(), &column);
        assert_eq!(estimate(&stats), DISQUALIFIED);
        assert!(encode(&stats, &mut Vec::new()).is_err());
    }

    #[test]
    fn full_size_dictionary_fits_the_header() {
        let op = ValueOperator::Primitive(PrimitiveKind::Int32);
        let column: Vec<Value> = (0..MAX_DICTIONARY_SIZE as i32).map(Value::Int32).collect();
        let stats = CompressStats::new(&op, CodecOptions::default(), &column);
        let mut out = Vec::new();
        encode(&stats, &mut out).unwrap();
        assert_eq!(&out[..2], &32767i16.to_be_bytes());
        let (decoded, _) = decode(&out, 0, column.len(), &op).unwrap();
        assert_eq!(decoded.last(), Some(&Value::Int32(65535)));
    }

    #[test]
    fn index_out_of_range_is_rejected() {
        let op = ValueOperator::Primitive(PrimitiveKind::Int16);
        // one entry, index byte 0x81 -> 1
        let buf = vec![0x80, 0x00, 0x00, 0x07, 0x81];
        assert!(decode(&buf, 0, 1, &op).is_err());
    }
}
