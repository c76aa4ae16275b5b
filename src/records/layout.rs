//! # Record Layout Metadata
//!
//! `LayoutMeta` is computed once per record type and describes where every
//! fixed-position piece of an encoded record lives. With it, the offset of a
//! sort key, list or reference field is a single i32 read at a known position.
//!
//! ## Header and Reference Section
//!
//! ```text
//! offset 0   u16 version
//! offset 2   u16 field count
//! offset 4   u16 reference section length
//! offset 6   reference section:
//!              i32 sort key offset                  (only with a sort key)
//!              u8  list count                       (only with list fields)
//!              i32 list offset, per list field
//!              u8  reference count                  (only with reference fields)
//!              (u16 field id, i32 offset), per reference field
//!            null bitmap, ceil(field count / 8) bytes
//!            payloads in field id order
//! ```
//!
//! Each group is emitted only when the type has at least one member, so a
//! type with no sort key, lists or reference fields has an empty section.
//!
//! Offsets are absolute positions in the record buffer and point at the start
//! of the payload, length prefix included. An absent field stores -1.
//!
//! ## Sequence Numbers
//!
//! A list field's sequence number is its position among the type's list
//! fields in id order; the same holds for reference fields. The slot of a
//! field is `group start + count byte + sequence * slot size`.

use eyre::{ensure, Result};

use crate::config::{
    ABSENT_OFFSET, FIELD_ID_SIZE, GROUP_COUNT_SIZE, OFFSET_SLOT_SIZE, RECORD_HEADER_SIZE,
};
use crate::encoding::bytes::{patch_i32, read_i32, read_u16};
use crate::types::RecordType;

#[derive(Debug, Clone)]
pub struct LayoutMeta {
    field_count: usize,
    sort_key_idx: Option<usize>,
    sort_key_slot: Option<usize>,
    collection_slots: Vec<Option<usize>>,
    reference_slots: Vec<Option<usize>>,
    collection_ids: Vec<u16>,
    reference_ids: Vec<u16>,
    ref_section_len: usize,
    bitmap_len: usize,
}

impl LayoutMeta {
    pub fn new(record_type: &RecordType) -> Self {
        let fields = record_type.fields();
        let field_count = fields.len();
        let sort_key_idx = fields.iter().position(|f| f.is_sort_key());

        let mut cursor = RECORD_HEADER_SIZE;
        let sort_key_slot = sort_key_idx.map(|_| {
            let slot = cursor;
            cursor += OFFSET_SLOT_SIZE;
            slot
        });

        let mut collection_slots = vec![None; field_count];
        let collection_ids: Vec<u16> = fields
            .iter()
            .filter(|f| f.is_list())
            .map(|f| f.id())
            .collect();
        if !collection_ids.is_empty() {
            cursor += GROUP_COUNT_SIZE;
            for id in &collection_ids {
                collection_slots[*id as usize - 1] = Some(cursor);
                cursor += OFFSET_SLOT_SIZE;
            }
        }

        let mut reference_slots = vec![None; field_count];
        let reference_ids: Vec<u16> = fields
            .iter()
            .filter(|f| f.is_reference())
            .map(|f| f.id())
            .collect();
        if !reference_ids.is_empty() {
            cursor += GROUP_COUNT_SIZE;
            for id in &reference_ids {
                reference_slots[*id as usize - 1] = Some(cursor + FIELD_ID_SIZE);
                cursor += FIELD_ID_SIZE + OFFSET_SLOT_SIZE;
            }
        }

        Self {
            field_count,
            sort_key_idx,
            sort_key_slot,
            collection_slots,
            reference_slots,
            collection_ids,
            reference_ids,
            ref_section_len: cursor - RECORD_HEADER_SIZE,
            bitmap_len: RecordType::null_bitmap_size(field_count),
        }
    }

    pub fn field_count(&self) -> usize {
        self.field_count
    }

    pub fn reference_section_len(&self) -> usize {
        self.ref_section_len
    }

    pub fn null_bitmap_len(&self) -> usize {
        self.bitmap_len
    }

    /// Bytes before the first payload: fixed header, reference section, bitmap.
    pub fn header_len(&self) -> usize {
        RECORD_HEADER_SIZE + self.ref_section_len + self.bitmap_len
    }

    pub fn bitmap_start(&self) -> usize {
        RECORD_HEADER_SIZE + self.ref_section_len
    }

    pub fn sort_key_idx(&self) -> Option<usize> {
        self.sort_key_idx
    }

    /// Whether the field at `idx` has an offset slot in the reference section.
    pub fn is_fast_path(&self, idx: usize) -> bool {
        Some(idx) == self.sort_key_idx
            || self.collection_slots.get(idx).is_some_and(Option::is_some)
            || self.reference_slots.get(idx).is_some_and(Option::is_some)
    }

    /// Appends the reference section with every offset set to -1.
    pub fn write_placeholder(&self, out: &mut Vec<u8>) {
        let absent = ABSENT_OFFSET.to_be_bytes();
        if self.sort_key_slot.is_some() {
            out.extend_from_slice(&absent);
        }
        if !self.collection_ids.is_empty() {
            out.push(self.collection_ids.len() as u8);
            for _ in &self.collection_ids {
                out.extend_from_slice(&absent);
            }
        }
        if !self.reference_ids.is_empty() {
            out.push(self.reference_ids.len() as u8);
            for id in &self.reference_ids {
                out.extend_from_slice(&id.to_be_bytes());
                out.extend_from_slice(&absent);
            }
        }
    }

    /// Stores `offset` in every slot the field at `idx` owns.
    ///
    /// `base` is the start of the record inside `buf`; stored offsets are
    /// relative to it.
    pub fn backfill(&self, idx: usize, buf: &mut [u8], base: usize, offset: usize) {
        let value = offset as i32;
        if Some(idx) == self.sort_key_idx {
            if let Some(slot) = self.sort_key_slot {
                patch_i32(buf, base + slot, value);
            }
        }
        if let Some(Some(slot)) = self.collection_slots.get(idx) {
            patch_i32(buf, base + slot, value);
        }
        if let Some(Some(slot)) = self.reference_slots.get(idx) {
            patch_i32(buf, base + slot, value);
        }
    }

    pub fn sort_key_offset(&self, buf: &[u8]) -> Result<Option<usize>> {
        match self.sort_key_slot {
            Some(slot) => Self::read_slot(buf, slot),
            None => eyre::bail!("record type has no sort key"),
        }
    }

    pub fn collection_field_offset(&self, id: u16, buf: &[u8]) -> Result<Option<usize>> {
        match Self::slot_for(&self.collection_slots, id) {
            Some(slot) => Self::read_slot(buf, slot),
            None => eyre::bail!("field {} is not a list field", id),
        }
    }

    pub fn reference_field_offset(&self, id: u16, buf: &[u8]) -> Result<Option<usize>> {
        match Self::slot_for(&self.reference_slots, id) {
            Some(slot) => {
                let stored = read_u16(buf, slot - FIELD_ID_SIZE)?;
                ensure!(
                    stored == id,
                    "reference slot for field {} holds field id {}",
                    id,
                    stored
                );
                Self::read_slot(buf, slot)
            }
            None => eyre::bail!("field {} is not a reference field", id),
        }
    }

    /// Reads the payload offset of a fast-path field from whichever slot it owns.
    pub fn fast_path_offset(&self, idx: usize, buf: &[u8]) -> Result<Option<usize>> {
        let id = idx as u16 + 1;
        if Some(idx) == self.sort_key_idx {
            self.sort_key_offset(buf)
        } else if self.reference_slots.get(idx).is_some_and(Option::is_some) {
            self.reference_field_offset(id, buf)
        } else {
            self.collection_field_offset(id, buf)
        }
    }

    fn slot_for(slots: &[Option<usize>], id: u16) -> Option<usize> {
        if id == 0 {
            return None;
        }
        slots.get(id as usize - 1).copied().flatten()
    }

    fn read_slot(buf: &[u8], slot: usize) -> Result<Option<usize>> {
        let offset = read_i32(buf, slot)?;
        if offset == ABSENT_OFFSET {
            return Ok(None);
        }
        ensure!(
            offset >= 0 && (offset as usize) < buf.len(),
            "reference slot at {} points outside the record: {}",
            slot,
            offset
        );
        Ok(Some(offset as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldDescriptor, FieldType, PrimitiveKind, SortOrder};

    fn prim(id: u16, name: &str, kind: PrimitiveKind) -> FieldDescriptor {
        FieldDescriptor::new(id, name, FieldType::primitive(kind))
    }

    #[test]
    fn empty_reference_section_without_special_fields() {
        let t = RecordType::new(
            "plain",
            vec![
                prim(1, "a", PrimitiveKind::Int32),
                prim(2, "b", PrimitiveKind::String),
            ],
        )
        .unwrap();
        let layout = LayoutMeta::new(&t);
        assert_eq!(layout.reference_section_len(), 0);
        assert_eq!(layout.header_len(), 7);
        assert!(!layout.is_fast_path(0));
    }

    #[test]
    fn section_sizes_add_up() {
        let t = RecordType::new(
            "full",
            vec![
                prim(1, "id", PrimitiveKind::Int64).required().has_reference(),
                prim(2, "rank", PrimitiveKind::Int32)
                    .required()
                    .sort_key(SortOrder::Ascending),
                FieldDescriptor::new(
                    3,
                    "tags",
                    FieldType::list(FieldType::primitive(PrimitiveKind::String)),
                ),
                prim(4, "note", PrimitiveKind::String).has_reference(),
            ],
        )
        .unwrap();
        let layout = LayoutMeta::new(&t);
        // sort key 4 + lists (1 + 4) + references (1 + 2 * 6)
        assert_eq!(layout.reference_section_len(), 4 + 5 + 13);
        assert_eq!(layout.header_len(), 6 + 22 + 1);
        assert!(layout.is_fast_path(0));
        assert!(layout.is_fast_path(1));
        assert!(layout.is_fast_path(2));
        assert!(layout.is_fast_path(3));

        let mut buf = vec![0u8; RECORD_HEADER_SIZE];
        layout.write_placeholder(&mut buf);
        assert_eq!(buf.len(), RECORD_HEADER_SIZE + 22);
        assert_eq!(&buf[6..10], &[0xFF; 4]);
        assert_eq!(buf[10], 1);
        assert_eq!(buf[15], 2);
        assert_eq!(&buf[16..18], &[0, 1]);
        assert_eq!(&buf[22..24], &[0, 4]);

        assert_eq!(layout.sort_key_offset(&buf).unwrap(), None);
        buf.resize(64, 0);
        layout.backfill(3, &mut buf, 0, 40);
        assert_eq!(layout.reference_field_offset(4, &buf).unwrap(), Some(40));
        assert_eq!(layout.fast_path_offset(3, &buf).unwrap(), Some(40));
        assert_eq!(layout.reference_field_offset(1, &buf).unwrap(), None);
    }

    #[test]
    fn lookup_of_unslotted_field_fails() {
        let t = RecordType::new("t", vec![prim(1, "a", PrimitiveKind::Int32)]).unwrap();
        let layout = LayoutMeta::new(&t);
        let buf = vec![0u8; 8];
        assert!(layout.sort_key_offset(&buf).is_err());
        assert!(layout.reference_field_offset(1, &buf).is_err());
        assert!(layout.collection_field_offset(1, &buf).is_err());
    }
}
