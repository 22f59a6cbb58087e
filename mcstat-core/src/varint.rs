//! Variable-length integers as used by the status protocol framing.
//!
//! Seven data bits per byte, least significant group first. Bit 7 set
//! means another byte follows. A `u32` never needs more than five bytes.

use bytes::{Buf, BufMut};

use crate::error::ProbeError;

/// Longest valid encoding of a 32-bit value.
pub const MAX_VARINT_LEN: usize = 5;

/// Encode `value` into a fresh buffer.
pub fn encode_varint(value: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(varint_len(value));
    put_varint(&mut buf, value);
    buf
}

/// Append the encoding of `value` to `dst`.
pub fn put_varint<B: BufMut>(dst: &mut B, mut value: u32) {
    while value & !0x7F != 0 {
        dst.put_u8((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    dst.put_u8(value as u8);
}

/// Number of bytes `value` occupies on the wire.
pub fn varint_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0x0FFF_FFFF => 4,
        _ => 5,
    }
}

/// Consume one varint from `src`, a byte at a time.
///
/// Fails with `"varint too long"` once five bytes have been read without
/// a terminating byte, and with `"truncated varint"` if `src` runs dry.
pub fn decode_varint<B: Buf>(src: &mut B) -> Result<u32, ProbeError> {
    let mut value = 0u32;
    for shift in (0..MAX_VARINT_LEN).map(|i| i * 7) {
        if !src.has_remaining() {
            return Err(ProbeError::protocol("truncated varint"));
        }
        let byte = src.get_u8();
        value |= u32::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(ProbeError::protocol("varint too long"))
}

/// Decode a varint at the start of `src` without consuming it.
///
/// Returns `Ok(None)` when more bytes are needed, otherwise the value
/// and the number of bytes it spans.
pub fn peek_varint(src: &[u8]) -> Result<Option<(u32, usize)>, ProbeError> {
    let mut value = 0u32;
    for (i, &byte) in src.iter().take(MAX_VARINT_LEN).enumerate() {
        value |= u32::from(byte & 0x7F) << (i * 7);
        if byte & 0x80 == 0 {
            return Ok(Some((value, i + 1)));
        }
    }
    if src.len() >= MAX_VARINT_LEN {
        Err(ProbeError::protocol("varint too long"))
    } else {
        Ok(None)
    }
}
