//! ZigZag varint and unsigned varint encode/decode, shared by the Writer
//! and Reader. Kafka's flex versions use unsigned varints for compact
//! lengths and ZigZag varints for signed integer fields.

use crate::error::ProtocolCodecError;
use bytes::{Buf, BufMut, BytesMut};

/// Encodes `value` as an unsigned LEB128 varint (7 bits per byte, MSB set
/// on all but the last byte).
pub fn put_unsigned_varint(buffer: &mut BytesMut, value: u32) {
    let mut v = value;
    loop {
        if v & !0x7f == 0 {
            buffer.put_u8(v as u8);
            return;
        }
        buffer.put_u8(((v & 0x7f) | 0x80) as u8);
        v >>= 7;
    }
}

/// Encodes `value` as a ZigZag-mapped signed varint.
pub fn put_varint(buffer: &mut BytesMut, value: i32) {
    let zigzag = ((value << 1) ^ (value >> 31)) as u32;
    put_unsigned_varint(buffer, zigzag);
}

pub fn put_unsigned_varlong(buffer: &mut BytesMut, value: u64) {
    let mut v = value;
    loop {
        if v & !0x7f == 0 {
            buffer.put_u8(v as u8);
            return;
        }
        buffer.put_u8(((v & 0x7f) | 0x80) as u8);
        v >>= 7;
    }
}

pub fn put_varlong(buffer: &mut BytesMut, value: i64) {
    let zigzag = ((value << 1) ^ (value >> 63)) as u64;
    put_unsigned_varlong(buffer, zigzag);
}

/// Reads an unsigned varint, failing with [`ProtocolCodecError::InvalidVarint`]
/// if the buffer runs out before a terminating byte or the encoded value
/// overflows 32 bits (more than 5 continuation bytes).
pub fn get_unsigned_varint(buffer: &mut impl Buf) -> Result<u32, ProtocolCodecError> {
    let mut result: u32 = 0;
    for shift in (0..35).step_by(7) {
        if !buffer.has_remaining() {
            return Err(ProtocolCodecError::InvalidVarint);
        }
        let byte = buffer.get_u8();
        result |= ((byte & 0x7f) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(ProtocolCodecError::InvalidVarint)
}

pub fn get_varint(buffer: &mut impl Buf) -> Result<i32, ProtocolCodecError> {
    let raw = get_unsigned_varint(buffer)?;
    Ok(((raw >> 1) as i32) ^ -((raw & 1) as i32))
}

pub fn get_unsigned_varlong(buffer: &mut impl Buf) -> Result<u64, ProtocolCodecError> {
    let mut result: u64 = 0;
    for shift in (0..70).step_by(7) {
        if !buffer.has_remaining() {
            return Err(ProtocolCodecError::InvalidVarint);
        }
        let byte = buffer.get_u8();
        result |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(ProtocolCodecError::InvalidVarint)
}

pub fn get_varlong(buffer: &mut impl Buf) -> Result<i64, ProtocolCodecError> {
    let raw = get_unsigned_varlong(buffer)?;
    Ok(((raw >> 1) as i64) ^ -((raw & 1) as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_varint_roundtrip() {
        for value in [0u32, 1, 127, 128, 16384, u32::MAX] {
            let mut buffer = BytesMut::new();
            put_unsigned_varint(&mut buffer, value);
            let mut reader = &buffer[..];
            assert_eq!(get_unsigned_varint(&mut reader).unwrap(), value);
        }
    }

    #[test]
    fn signed_varint_roundtrip() {
        for value in [0i32, -1, 1, i32::MIN, i32::MAX, -128, 128] {
            let mut buffer = BytesMut::new();
            put_varint(&mut buffer, value);
            let mut reader = &buffer[..];
            assert_eq!(get_varint(&mut reader).unwrap(), value);
        }
    }

    #[test]
    fn varlong_roundtrip() {
        for value in [0i64, -1, i64::MIN, i64::MAX, 1 << 40] {
            let mut buffer = BytesMut::new();
            put_varlong(&mut buffer, value);
            let mut reader = &buffer[..];
            assert_eq!(get_varlong(&mut reader).unwrap(), value);
        }
    }

    #[test]
    fn truncated_varint_is_an_error() {
        let mut reader: &[u8] = &[0x80, 0x80];
        assert!(matches!(
            get_unsigned_varint(&mut reader),
            Err(ProtocolCodecError::InvalidVarint)
        ));
    }
}
