//! Tag-buffer helpers shared by the Writer and Reader.
//!
//! A tag buffer is an unsigned-varint count followed by that many
//! `(tag_id: unsigned varint, data: compact bytes)` pairs. No caller in
//! this crate registers a tag handler, so the reader always discards the
//! payloads — unknown tags are forward-compatible by design.

use crate::codec::varint::{get_unsigned_varint, put_unsigned_varint};
use crate::error::ProtocolCodecError;
use bytes::{Buf, BufMut, BytesMut};

/// Writes an empty tag buffer: a single zero byte.
pub fn put_empty_tagged_fields(buffer: &mut BytesMut) {
    put_unsigned_varint(buffer, 0);
}

/// Reads and discards a tag buffer, returning the number of tags skipped.
pub fn skip_tagged_fields(buffer: &mut impl Buf) -> Result<u32, ProtocolCodecError> {
    let count = get_unsigned_varint(buffer)?;
    for _ in 0..count {
        let _tag_id = get_unsigned_varint(buffer)?;
        let len = get_unsigned_varint(buffer)? as usize;
        if buffer.remaining() < len {
            return Err(ProtocolCodecError::insufficient_bytes(len, buffer.remaining()));
        }
        buffer.advance(len);
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tagged_fields_roundtrip() {
        let mut buffer = BytesMut::new();
        put_empty_tagged_fields(&mut buffer);
        let mut reader = &buffer[..];
        assert_eq!(skip_tagged_fields(&mut reader).unwrap(), 0);
        assert!(!reader.has_remaining());
    }

    #[test]
    fn unknown_tags_are_skipped() {
        let mut buffer = BytesMut::new();
        put_unsigned_varint(&mut buffer, 1);
        put_unsigned_varint(&mut buffer, 7); // tag id
        put_unsigned_varint(&mut buffer, 3); // payload length
        buffer.put_slice(b"xyz");

        let mut reader = &buffer[..];
        assert_eq!(skip_tagged_fields(&mut reader).unwrap(), 1);
        assert!(!reader.has_remaining());
    }
}
