//! Primitive wire readers and writers.
//!
//! Varints are unsigned LEB128: seven value bits per byte, least significant
//! group first, high bit set on every byte except the last. Fixed-width
//! integers are little-endian. Reads go through a [`bytes::Buf`] cursor and
//! writes append to a [`bytes::BufMut`].

use crate::error::{Error, Result};
use bytes::{Buf, BufMut};

/// Longest valid encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

pub fn varint_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

pub fn write_varint<B: BufMut>(mut value: u64, buf: &mut B) {
    while value >= 0x80 {
        buf.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

pub fn read_varint<B: Buf>(buf: &mut B) -> Result<u64> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;
    for _ in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(Error::Decode("truncated varint".to_string()));
        }
        let byte = buf.get_u8();
        let low = (byte & 0x7F) as u64;
        // Tenth byte may only carry the single remaining bit
        if shift == 63 && low > 1 {
            return Err(Error::Decode("varint overflows u64".to_string()));
        }
        value |= low << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
    Err(Error::Decode(format!(
        "varint longer than {} bytes",
        MAX_VARINT_LEN
    )))
}

pub fn write_u8<B: BufMut>(value: u8, buf: &mut B) {
    buf.put_u8(value);
}

pub fn read_u8<B: Buf>(buf: &mut B) -> Result<u8> {
    ensure_remaining(buf, 1, "uint8")?;
    Ok(buf.get_u8())
}

pub fn write_i32<B: BufMut>(value: i32, buf: &mut B) {
    buf.put_i32_le(value);
}

pub fn read_i32<B: Buf>(buf: &mut B) -> Result<i32> {
    ensure_remaining(buf, 4, "int32")?;
    Ok(buf.get_i32_le())
}

fn ensure_remaining<B: Buf>(buf: &B, needed: usize, what: &str) -> Result<()> {
    let remaining = buf.remaining();
    if remaining < needed {
        return Err(Error::Decode(format!(
            "truncated {}: need {} bytes, {} remaining",
            what, needed, remaining
        )));
    }
    Ok(())
}
