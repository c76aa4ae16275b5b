//! # Big-Endian Field Readers
//!
//! Bounds-checked readers for the fixed-width integers that make up record
//! and PAX buffers. Every multi-byte integer in both formats is big-endian.
//!
//! Each reader takes the buffer and an absolute offset and fails with a
//! descriptive error when the buffer is too short, so callers can propagate
//! truncation with `?` instead of indexing and panicking.
//!
//! Writers are not wrapped: the codec appends `value.to_be_bytes()` directly.

use eyre::{ensure, Result};

/// Returns `buf[offset..offset + len]`, or an error naming `what` if truncated.
pub fn read_slice<'a>(buf: &'a [u8], offset: usize, len: usize, what: &str) -> Result<&'a [u8]> {
    let end = offset
        .checked_add(len)
        .ok_or_else(|| eyre::eyre!("{} length {} overflows at offset {}", what, len, offset))?;
    ensure!(
        end <= buf.len(),
        "truncated {}: need {} bytes at offset {}, buffer has {}",
        what,
        len,
        offset,
        buf.len()
    );
    Ok(&buf[offset..end])
}

fn read_array<const N: usize>(buf: &[u8], offset: usize, what: &str) -> Result<[u8; N]> {
    let bytes = read_slice(buf, offset, N, what)?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

pub fn read_u8(buf: &[u8], offset: usize) -> Result<u8> {
    Ok(read_array::<1>(buf, offset, "u8")?[0])
}

pub fn read_i8(buf: &[u8], offset: usize) -> Result<i8> {
    Ok(read_array::<1>(buf, offset, "i8")?[0] as i8)
}

pub fn read_u16(buf: &[u8], offset: usize) -> Result<u16> {
    Ok(u16::from_be_bytes(read_array(buf, offset, "u16")?))
}

pub fn read_i16(buf: &[u8], offset: usize) -> Result<i16> {
    Ok(i16::from_be_bytes(read_array(buf, offset, "i16")?))
}

pub fn read_i32(buf: &[u8], offset: usize) -> Result<i32> {
    Ok(i32::from_be_bytes(read_array(buf, offset, "i32")?))
}

pub fn read_i64(buf: &[u8], offset: usize) -> Result<i64> {
    Ok(i64::from_be_bytes(read_array(buf, offset, "i64")?))
}

pub fn read_f32(buf: &[u8], offset: usize) -> Result<f32> {
    Ok(f32::from_bits(u32::from_be_bytes(read_array(buf, offset, "f32")?)))
}

pub fn read_f64(buf: &[u8], offset: usize) -> Result<f64> {
    Ok(f64::from_bits(u64::from_be_bytes(read_array(buf, offset, "f64")?)))
}

/// Reads an i32 length prefix and rejects negative values.
pub fn read_len_i32(buf: &[u8], offset: usize) -> Result<usize> {
    let len = read_i32(buf, offset)?;
    ensure!(len >= 0, "negative length prefix {} at offset {}", len, offset);
    Ok(len as usize)
}

/// Overwrites the i32 at `offset` in a buffer being built.
pub fn patch_i32(buf: &mut [u8], offset: usize, value: i32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}
