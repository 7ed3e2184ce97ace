//! Typed encoder (component B) emitting the Kafka wire vocabulary into a
//! growable buffer. Mirrors the teacher's `WireFormat` encode helpers
//! (`src/protocol/encoding.rs`) but generalized to the full vocabulary
//! spec.md §4.1 requires: varints, compact lengths, UUIDs, arrays and
//! tagged fields, in addition to the fixed-width integers and int16/int32
//! string and bytes lengths the teacher already had.

use crate::codec::tagged_fields::put_empty_tagged_fields;
use crate::codec::varint::{put_unsigned_varint, put_varint, put_varlong};
use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

/// Context the connection engine consults after encoding a request body.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterContext {
    /// The caller does not expect a response frame (e.g. a produce call
    /// with acks=0). Set by the API descriptor, read by `Connection::send`.
    pub no_response: bool,
}

/// Single-use typed encoder over a growable buffer. Every `append_*` method
/// returns `&mut Self` so calls can be chained in the bit-exact field order
/// the wire format demands.
#[derive(Debug, Default)]
pub struct Writer {
    buffer: BytesMut,
    pub context: WriterContext,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            context: WriterContext::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn append_int8(&mut self, value: i8) -> &mut Self {
        self.buffer.put_i8(value);
        self
    }

    pub fn append_int16(&mut self, value: i16) -> &mut Self {
        self.buffer.put_i16(value);
        self
    }

    pub fn append_int32(&mut self, value: i32) -> &mut Self {
        self.buffer.put_i32(value);
        self
    }

    pub fn append_int64(&mut self, value: i64) -> &mut Self {
        self.buffer.put_i64(value);
        self
    }

    pub fn append_uint8(&mut self, value: u8) -> &mut Self {
        self.buffer.put_u8(value);
        self
    }

    pub fn append_uint16(&mut self, value: u16) -> &mut Self {
        self.buffer.put_u16(value);
        self
    }

    pub fn append_uint32(&mut self, value: u32) -> &mut Self {
        self.buffer.put_u32(value);
        self
    }

    pub fn append_uint64(&mut self, value: u64) -> &mut Self {
        self.buffer.put_u64(value);
        self
    }

    pub fn append_boolean(&mut self, value: bool) -> &mut Self {
        self.buffer.put_u8(if value { 1 } else { 0 });
        self
    }

    pub fn append_var_int(&mut self, value: i32) -> &mut Self {
        put_varint(&mut self.buffer, value);
        self
    }

    pub fn append_unsigned_var_int(&mut self, value: u32) -> &mut Self {
        put_unsigned_varint(&mut self.buffer, value);
        self
    }

    pub fn append_var_long(&mut self, value: i64) -> &mut Self {
        put_varlong(&mut self.buffer, value);
        self
    }

    /// Encodes a canonical hyphenated-hex UUID as 16 raw bytes. Panics if
    /// `value` is not a valid UUID string — callers are expected to parse
    /// UUIDs at their own boundary; by the time a descriptor calls this the
    /// value must already be well-formed.
    pub fn append_uuid(&mut self, value: &str) -> &mut Self {
        let uuid = Uuid::parse_str(value).unwrap_or_else(|e| {
            panic!("append_uuid: {value:?} is not a valid UUID: {e}")
        });
        self.buffer.put_slice(uuid.as_bytes());
        self
    }

    pub fn append_uuid_bytes(&mut self, value: [u8; 16]) -> &mut Self {
        self.buffer.put_slice(&value);
        self
    }

    /// `append_string(value, compact)`. `value == None` is only legal when
    /// the field is declared nullable by its descriptor; supplying it for a
    /// non-nullable field is a programming error and panics, per spec.md
    /// §4.1.
    pub fn append_string(&mut self, value: Option<&str>, compact: bool) -> &mut Self {
        self.append_bytes_like(value.map(str::as_bytes), compact, "string")
    }

    pub fn append_bytes(&mut self, value: Option<&[u8]>, compact: bool) -> &mut Self {
        self.append_bytes_like(value, compact, "bytes")
    }

    fn append_bytes_like(
        &mut self,
        value: Option<&[u8]>,
        compact: bool,
        field_kind: &'static str,
    ) -> &mut Self {
        match value {
            None => {
                if compact {
                    put_unsigned_varint(&mut self.buffer, 0);
                } else {
                    self.buffer.put_i16(-1);
                }
            }
            Some(bytes) => {
                if compact {
                    put_unsigned_varint(&mut self.buffer, bytes.len() as u32 + 1);
                } else if field_kind == "string" {
                    self.buffer.put_i16(bytes.len() as i16);
                } else {
                    self.buffer.put_i32(bytes.len() as i32);
                }
                self.buffer.put_slice(bytes);
            }
        }
        self
    }

    /// `append_array`: encodes the length prefix per the compact/nullable
    /// rule, then each item via `encode_item`. `nullable` distinguishes the
    /// null-array encoding (0 compact / -1 int32) from the empty-array
    /// encoding (1 compact / 0 int32) — the two MUST stay distinguishable on
    /// the wire (spec.md §4.1).
    pub fn append_array<T>(
        &mut self,
        items: Option<&[T]>,
        compact: bool,
        nullable: bool,
        mut encode_item: impl FnMut(&mut Self, &T),
    ) -> &mut Self {
        match items {
            None => {
                if !nullable {
                    panic!("append_array: null array supplied for non-nullable field");
                }
                if compact {
                    put_unsigned_varint(&mut self.buffer, 0);
                } else {
                    self.buffer.put_i32(-1);
                }
            }
            Some(items) => {
                if compact {
                    put_unsigned_varint(&mut self.buffer, items.len() as u32 + 1);
                } else {
                    self.buffer.put_i32(items.len() as i32);
                }
                for item in items {
                    encode_item(self, item);
                }
            }
        }
        self
    }

    pub fn append_tagged_fields(&mut self) -> &mut Self {
        put_empty_tagged_fields(&mut self.buffer);
        self
    }

    /// Appends raw, already-encoded bytes (used to splice a sub-writer's
    /// output, e.g. an API body onto a request header).
    pub fn append_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buffer.put_slice(bytes);
        self
    }

    /// Computes the current length and inserts it as a leading int32,
    /// producing a self-delimited frame. Used exactly once, just before the
    /// payload leaves the connection engine.
    pub fn prepend_length(&mut self) -> &mut Self {
        let mut framed = BytesMut::with_capacity(self.buffer.len() + 4);
        framed.put_i32(self.buffer.len() as i32);
        framed.put_slice(&self.buffer);
        self.buffer = framed;
        self
    }

    /// Consumes the writer, returning the encoded bytes. The writer is
    /// single-use: once the bytes are handed to the connection they are not
    /// reused (spec.md §4.1).
    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::reader::Reader;

    #[test]
    fn fixed_width_integers_roundtrip() {
        let mut writer = Writer::new();
        writer
            .append_int8(-1)
            .append_int16(-2)
            .append_int32(-3)
            .append_int64(-4)
            .append_uint32(42);
        let bytes = writer.into_bytes();
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_int8().unwrap(), -1);
        assert_eq!(reader.read_int16().unwrap(), -2);
        assert_eq!(reader.read_int32().unwrap(), -3);
        assert_eq!(reader.read_int64().unwrap(), -4);
        assert_eq!(reader.read_uint32().unwrap(), 42);
    }

    #[test]
    fn compact_string_null_is_single_zero_byte() {
        let mut writer = Writer::new();
        writer.append_string(None, true);
        let bytes = writer.into_bytes();
        assert_eq!(&bytes[..], &[0u8]);
    }

    #[test]
    fn non_compact_string_null_is_minus_one() {
        let mut writer = Writer::new();
        writer.append_string(None, false);
        let bytes = writer.into_bytes();
        assert_eq!(&bytes[..], &(-1i16).to_be_bytes());
    }

    #[test]
    fn array_null_and_empty_are_distinguishable_compact() {
        let mut null_writer = Writer::new();
        null_writer.append_array::<i32>(None, true, true, |w, v| {
            w.append_int32(*v);
        });

        let mut empty_writer = Writer::new();
        empty_writer.append_array::<i32>(Some(&[]), true, true, |w, v| {
            w.append_int32(*v);
        });

        assert_ne!(null_writer.as_slice(), empty_writer.as_slice());
        assert_eq!(null_writer.as_slice(), &[0u8]);
        assert_eq!(empty_writer.as_slice(), &[1u8]);
    }

    #[test]
    fn prepend_length_frames_the_payload() {
        let mut writer = Writer::new();
        writer.append_int16(7);
        writer.prepend_length();
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), 6);
        assert_eq!(&bytes[0..4], &2i32.to_be_bytes());
        assert_eq!(&bytes[4..6], &7i16.to_be_bytes());
    }

    #[test]
    fn uuid_roundtrip() {
        let uuid = Uuid::new_v4();
        let mut writer = Writer::new();
        writer.append_uuid(&uuid.to_string());
        let bytes = writer.into_bytes();
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_uuid().unwrap(), uuid.to_string());
    }
}
