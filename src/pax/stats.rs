//! # Column Statistics
//!
//! `CompressStats` is built once per column per encode call and feeds every
//! scheme's size estimate. It borrows the column's values, so building it
//! copies nothing but pointers.
//!
//! | Statistic | Used by |
//! |-----------|---------|
//! | total naive size | NoCompression, CommonValue |
//! | run-length size | RunLength |
//! | distinct values, in first-seen order | Dictionary |
//! | most frequent value and its count | CommonValue |
//!
//! Value sizes are row-form sizes: what `ValueOperator::write_value` appends
//! for the value, length prefix included.
//!
//! The most frequent value is the earliest-seen value among those with the
//! highest count, so the choice does not depend on hash order.

use hashbrown::HashMap;

use crate::config::{CodecOptions, MAX_RUN_LENGTH};
use crate::records::operator::ValueOperator;
use crate::types::{PrimitiveKind, Value};

#[derive(Debug)]
pub struct CompressStats<'a> {
    op: &'a ValueOperator,
    options: CodecOptions,
    values: Vec<&'a Value>,
    frequencies: HashMap<&'a Value, usize>,
    distinct: Vec<&'a Value>,
    total_size: usize,
    distinct_size: usize,
    most_frequent: Option<&'a Value>,
    most_frequent_count: usize,
    run_length_size: usize,
}

impl<'a> CompressStats<'a> {
    /// Collects statistics over `values`, which must be non-null and valid
    /// for `op`.
    pub fn new(
        op: &'a ValueOperator,
        options: CodecOptions,
        values: impl IntoIterator<Item = &'a Value>,
    ) -> Self {
        let values: Vec<&'a Value> = values.into_iter().collect();
        let mut frequencies: HashMap<&'a Value, usize> = HashMap::new();
        let mut distinct = Vec::new();
        let mut total_size = 0usize;
        let mut distinct_size = 0usize;
        let mut run_length_size = 0usize;
        let mut run: Option<(&'a Value, usize)> = None;

        for value in &values {
            let size = op.encoded_len(value, options);
            total_size += size;

            let count = frequencies.entry(*value).or_insert(0);
            if *count == 0 {
                distinct.push(*value);
                distinct_size += size;
            }
            *count += 1;

            run = match run {
                Some((current, len)) if current == *value && len < MAX_RUN_LENGTH => {
                    Some((current, len + 1))
                }
                _ => {
                    run_length_size += 1 + size;
                    Some((*value, 1))
                }
            };
        }

        let mut most_frequent = None;
        let mut most_frequent_count = 0;
        for value in &distinct {
            let count = frequencies[value];
            if count > most_frequent_count {
                most_frequent = Some(*value);
                most_frequent_count = count;
            }
        }

        Self {
            op,
            options,
            values,
            frequencies,
            distinct,
            total_size,
            distinct_size,
            most_frequent,
            most_frequent_count,
            run_length_size,
        }
    }

    pub fn operator(&self) -> &'a ValueOperator {
        self.op
    }

    pub fn options(&self) -> CodecOptions {
        self.options
    }

    pub fn values(&self) -> &[&'a Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn frequency(&self, value: &Value) -> usize {
        self.frequencies.get(value).copied().unwrap_or(0)
    }

    /// Distinct values in first-seen order.
    pub fn distinct_values(&self) -> &[&'a Value] {
        &self.distinct
    }

    pub fn distinct_count(&self) -> usize {
        self.distinct.len()
    }

    /// Row-form size of the whole column, the NoCompression payload size.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Summed row-form size of each distinct value once.
    pub fn distinct_size(&self) -> usize {
        self.distinct_size
    }

    pub fn most_frequent(&self) -> Option<(&'a Value, usize)> {
        self.most_frequent.map(|v| (v, self.most_frequent_count))
    }

    pub fn run_length_size(&self) -> usize {
        self.run_length_size
    }

    pub fn value_size(&self, value: &Value) -> usize {
        self.op.encoded_len(value, self.options)
    }

    /// Primitive kind of the column, None for group and list columns.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self.op {
            ValueOperator::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }
}
