//! # MSB-First Bitmaps
//!
//! Both formats pack one bit per entry, most significant bit first:
//!
//! ```text
//! entry:  0 1 2 3 4 5 6 7 | 8 9 ...
//! byte 0: b7 ...       b0 | byte 1: b7 ...
//! ```
//!
//! The row format uses it as the null bitmap (1 = absent); the PAX format uses
//! it for nullable columns (1 = null) and the common-value scheme (1 = equals
//! the common value).

#[inline]
pub fn bitmap_len(entries: usize) -> usize {
    entries.div_ceil(8)
}

#[inline]
pub fn set_bit(bitmap: &mut [u8], idx: usize) {
    bitmap[idx / 8] |= 0x80 >> (idx % 8);
}

#[inline]
pub fn is_set(bitmap: &[u8], idx: usize) -> bool {
    (bitmap[idx / 8] & (0x80 >> (idx % 8))) != 0
}

/// Builds a bitmap with one bit per item of `items`, set where `pred` holds.
pub fn from_predicate<T>(items: &[T], mut pred: impl FnMut(&T) -> bool) -> Vec<u8> {
    let mut bitmap = vec![0u8; bitmap_len(items.len())];
    for (idx, item) in items.iter().enumerate() {
        if pred(item) {
            set_bit(&mut bitmap, idx);
        }
    }
    bitmap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_are_msb_first() {
        let mut bitmap = vec![0u8; 2];
        set_bit(&mut bitmap, 0);
        set_bit(&mut bitmap, 7);
        set_bit(&mut bitmap, 8);
        assert_eq!(bitmap, vec![0b1000_0001, 0b1000_0000]);
        assert!(is_set(&bitmap, 0));
        assert!(!is_set(&bitmap, 1));
        assert!(is_set(&bitmap, 8));
    }

    #[test]
    fn length_rounds_up() {
        assert_eq!(bitmap_len(0), 0);
        assert_eq!(bitmap_len(1), 1);
        assert_eq!(bitmap_len(8), 1);
        assert_eq!(bitmap_len(9), 2);
        assert_eq!(bitmap_len(17), 3);
    }

    #[test]
    fn predicate_bitmap() {
        let bitmap = from_predicate(&[1, 2, 1, 1, 3, 1, 1, 1, 1], |v| *v == 1);
        assert_eq!(bitmap, vec![0b1011_0111, 0b1000_0000]);
    }
}
