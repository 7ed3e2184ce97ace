//! Typed decoder (component C) consuming a contiguous byte slice. Mirrors
//! the Writer's vocabulary exactly, following the teacher's bounds-checked
//! `WireFormat::decode_*` style (`src/protocol/encoding.rs`) generalized to
//! varints, UUIDs, compact lengths and tagged fields.

use crate::codec::tagged_fields::skip_tagged_fields;
use crate::codec::varint::{get_unsigned_varint, get_varint, get_varlong};
use crate::error::ProtocolCodecError;
use uuid::Uuid;

/// Borrows a byte slice with a mutable `position`. All `read_*` operations
/// advance `position`; `skip` is explicit. Reading past the end raises
/// [`ProtocolCodecError::InsufficientBytes`].
pub struct Reader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn has_remaining(&self) -> bool {
        self.position < self.data.len()
    }

    /// Remaining, unconsumed bytes. Trailing tagged fields are not required
    /// to be consumed — the connection engine discards them by policy
    /// (spec.md §4.2).
    pub fn remaining_slice(&self) -> &'a [u8] {
        &self.data[self.position..]
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolCodecError> {
        if self.remaining() < n {
            return Err(ProtocolCodecError::insufficient_bytes(n, self.remaining()));
        }
        let slice = &self.data[self.position..self.position + n];
        self.position += n;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), ProtocolCodecError> {
        self.take(n).map(|_| ())
    }

    pub fn read_int8(&mut self) -> Result<i8, ProtocolCodecError> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_uint8(&mut self) -> Result<u8, ProtocolCodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_int16(&mut self) -> Result<i16, ProtocolCodecError> {
        Ok(i16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn read_uint16(&mut self) -> Result<u16, ProtocolCodecError> {
        Ok(u16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn read_int32(&mut self) -> Result<i32, ProtocolCodecError> {
        Ok(i32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_uint32(&mut self) -> Result<u32, ProtocolCodecError> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_int64(&mut self) -> Result<i64, ProtocolCodecError> {
        Ok(i64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn read_uint64(&mut self) -> Result<u64, ProtocolCodecError> {
        Ok(u64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn read_boolean(&mut self) -> Result<bool, ProtocolCodecError> {
        Ok(self.read_uint8()? != 0)
    }

    pub fn read_var_int(&mut self) -> Result<i32, ProtocolCodecError> {
        let mut slice = self.remaining_slice();
        let before = slice.len();
        let value = get_varint(&mut slice)?;
        self.position += before - slice.len();
        Ok(value)
    }

    pub fn read_unsigned_var_int(&mut self) -> Result<u32, ProtocolCodecError> {
        let mut slice = self.remaining_slice();
        let before = slice.len();
        let value = get_unsigned_varint(&mut slice)?;
        self.position += before - slice.len();
        Ok(value)
    }

    pub fn read_var_long(&mut self) -> Result<i64, ProtocolCodecError> {
        let mut slice = self.remaining_slice();
        let before = slice.len();
        let value = get_varlong(&mut slice)?;
        self.position += before - slice.len();
        Ok(value)
    }

    /// Reads 16 raw bytes and formats them as a canonical hyphenated-hex
    /// UUID string. The all-zero UUID is a legal value.
    pub fn read_uuid(&mut self) -> Result<String, ProtocolCodecError> {
        let bytes: [u8; 16] = self.take(16)?.try_into().unwrap();
        Ok(Uuid::from_bytes(bytes).to_string())
    }

    pub fn read_uuid_bytes(&mut self) -> Result<[u8; 16], ProtocolCodecError> {
        Ok(self.take(16)?.try_into().unwrap())
    }

    /// `read_string`/`read_nullable_string`, compact and non-compact forms
    /// collapsed into one method per spec.md §4.2's mirrored surface: a
    /// non-compact length of -1, or a compact length of 0, yields `None`.
    pub fn read_nullable_string(&mut self, compact: bool) -> Result<Option<String>, ProtocolCodecError> {
        match self.read_nullable_bytes(compact)? {
            None => Ok(None),
            Some(bytes) => Ok(Some(
                String::from_utf8(bytes.to_vec())
                    .map_err(|e| ProtocolCodecError::InvalidUtf8(e.to_string()))?,
            )),
        }
    }

    pub fn read_string(&mut self, compact: bool) -> Result<String, ProtocolCodecError> {
        self.read_nullable_string(compact)?
            .ok_or(ProtocolCodecError::UnexpectedNull { field: "string" })
    }

    pub fn read_nullable_bytes(&mut self, compact: bool) -> Result<Option<&'a [u8]>, ProtocolCodecError> {
        let length = if compact {
            let raw = self.read_unsigned_var_int()? as i64;
            raw - 1
        } else {
            self.read_int32()? as i64
        };

        if length < -1 {
            return Err(ProtocolCodecError::InvalidLength { length });
        }
        if length == -1 {
            return Ok(None);
        }
        Ok(Some(self.take(length as usize)?))
    }

    pub fn read_bytes(&mut self, compact: bool) -> Result<&'a [u8], ProtocolCodecError> {
        self.read_nullable_bytes(compact)?
            .ok_or(ProtocolCodecError::UnexpectedNull { field: "bytes" })
    }

    /// `read_array`. Nullability policy (spec.md §4.2):
    /// - `nullable=true`: compact prefix 0 -> null, 1 -> empty.
    /// - `nullable=false`: compact prefix 0 -> the empty sequence; null is
    ///   not representable, so a null prefix is treated as empty rather
    ///   than rejected.
    /// Non-compact mirrors with -1/0 in place of 0/1.
    pub fn read_array<T>(
        &mut self,
        compact: bool,
        nullable: bool,
        mut decode_item: impl FnMut(&mut Self) -> Result<T, ProtocolCodecError>,
    ) -> Result<Option<Vec<T>>, ProtocolCodecError> {
        let raw_count: i64 = if compact {
            self.read_unsigned_var_int()? as i64 - 1
        } else {
            self.read_int32()? as i64
        };

        if raw_count < -1 {
            return Err(ProtocolCodecError::InvalidLength { length: raw_count });
        }

        if raw_count == -1 {
            return Ok(if nullable { None } else { Some(Vec::new()) });
        }

        let mut items = Vec::with_capacity(raw_count as usize);
        for _ in 0..raw_count {
            items.push(decode_item(self)?);
        }
        Ok(Some(items))
    }

    /// Reads the tag count and, for each tag, the tag id and a
    /// length-prefixed opaque blob, discarding it (no caller registers a
    /// handler). Unknown tags are silently skipped.
    pub fn read_tagged_fields(&mut self) -> Result<u32, ProtocolCodecError> {
        let mut slice = self.remaining_slice();
        let before = slice.len();
        let count = skip_tagged_fields(&mut slice)?;
        self.position += before - slice.len();
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::writer::Writer;

    #[test]
    fn nullable_string_compact_null_is_single_zero_byte() {
        let bytes = {
            let mut w = Writer::new();
            w.append_string(None, true);
            w.into_bytes()
        };
        assert_eq!(&bytes[..], &[0u8]);
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_nullable_string(true).unwrap(), None);
    }

    #[test]
    fn array_nullable_false_treats_null_prefix_as_empty() {
        let mut buffer = bytes::BytesMut::new();
        crate::codec::varint::put_unsigned_varint(&mut buffer, 0);
        let mut reader = Reader::new(&buffer);
        let result = reader.read_array::<i32>(true, false, |r| r.read_int32());
        assert_eq!(result.unwrap(), Some(vec![]));
    }

    #[test]
    fn array_nullable_true_distinguishes_null_from_empty() {
        let mut null_buf = bytes::BytesMut::new();
        crate::codec::varint::put_unsigned_varint(&mut null_buf, 0);
        let mut reader = Reader::new(&null_buf);
        assert_eq!(
            reader.read_array::<i32>(true, true, |r| r.read_int32()).unwrap(),
            None
        );

        let mut empty_buf = bytes::BytesMut::new();
        crate::codec::varint::put_unsigned_varint(&mut empty_buf, 1);
        let mut reader = Reader::new(&empty_buf);
        assert_eq!(
            reader.read_array::<i32>(true, true, |r| r.read_int32()).unwrap(),
            Some(vec![])
        );
    }

    #[test]
    fn read_past_end_is_an_error() {
        let mut reader = Reader::new(&[0u8, 1]);
        assert!(reader.read_int32().is_err());
    }

    #[test]
    fn trailing_tagged_fields_need_not_be_consumed() {
        let bytes = {
            let mut w = Writer::new();
            w.append_int8(1);
            w.append_tagged_fields();
            w.into_bytes()
        };
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_int8().unwrap(), 1);
        // Caller is free to stop here; not consuming the tag buffer is not
        // an error by policy.
        assert!(reader.has_remaining());
    }
}
