//! # Sort Key Ordering
//!
//! `SortKeyComparator` orders records of one type by their sort key field,
//! reversing the order for descending keys. It is derived from the record
//! type once and then applied to as many records as needed.

use std::cmp::Ordering;

use eyre::Result;

use crate::records::record::{Record, WritableRecord};
use crate::types::{RecordType, SortOrder, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKeyComparator {
    field_id: u16,
    order: SortOrder,
}

impl SortKeyComparator {
    pub fn new(field_id: u16, order: SortOrder) -> Self {
        Self { field_id, order }
    }

    pub fn for_type(record_type: &RecordType) -> Result<Self> {
        let field = record_type
            .sort_key()
            .ok_or_else(|| eyre::eyre!("record type '{}' has no sort key", record_type.name()))?;
        let order = field.sort_order().unwrap_or(SortOrder::Ascending);
        Ok(Self::new(field.id(), order))
    }

    pub fn field_id(&self) -> u16 {
        self.field_id
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Orders two sort key values. NULL sorts first in ascending order.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ord = a.compare_for_sort(b);
        match self.order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    }

    pub fn compare_records<R: Record, S: Record>(&self, a: &mut R, b: &mut S) -> Result<Ordering> {
        let a = a.get_value(self.field_id)?;
        let b = b.get_value(self.field_id)?;
        Ok(self.compare(&a, &b))
    }

    /// Stable sort of `records` by their sort key.
    ///
    /// Keys are read once per record up front; encoded records stay encoded
    /// since the sort key is read through its offset slot.
    pub fn sort(&self, records: &mut Vec<WritableRecord>) -> Result<()> {
        let keys = records
            .iter_mut()
            .map(|record| record.get_value(self.field_id))
            .collect::<Result<Vec<_>>>()?;
        let mut keyed: Vec<_> = keys.into_iter().zip(records.drain(..)).collect();
        keyed.sort_by(|(a, _), (b, _)| self.compare(a, b));
        records.extend(keyed.into_iter().map(|(_, record)| record));
        Ok(())
    }
}
