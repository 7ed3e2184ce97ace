//! Growable, append-only byte buffer shared by the [`crate::codec::Writer`]
//! and [`crate::codec::Reader`].
//!
//! The buffer tracks a read cursor independently from the underlying
//! storage: reads never move data, they just advance `position`.
//! `consume` is the only operation that actually discards bytes, and it
//! invalidates any slice borrowed from the discarded prefix (enforced by
//! Rust's borrow checker since `consume` takes `&mut self`).

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// A growable buffer with an append cursor (`BytesMut`'s own length) and an
/// explicit read cursor (`position`).
///
/// Invariant: `position <= len()` always.
#[derive(Debug, Default)]
pub struct ByteBuffer {
    storage: BytesMut,
    position: usize,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self {
            storage: BytesMut::new(),
            position: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: BytesMut::with_capacity(capacity),
            position: 0,
        }
    }

    /// Appends bytes to the end of the buffer. Never touches `position`.
    pub fn append(&mut self, bytes: &[u8]) {
        self.storage.put_slice(bytes);
    }

    /// Total number of bytes currently stored, read or not.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Bytes not yet consumed by `consume`, regardless of `position`.
    pub fn unconsumed(&self) -> &[u8] {
        &self.storage
    }

    /// Bytes remaining to be read, starting at `position`.
    pub fn remaining_from_position(&self) -> &[u8] {
        &self.storage[self.position.min(self.storage.len())..]
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Moves the read cursor forward without discarding storage. Used by
    /// callers that want to peek ahead (e.g. the frame-length prefix) before
    /// committing to `consume`.
    pub fn advance_position(&mut self, n: usize) {
        self.position = (self.position + n).min(self.storage.len());
    }

    pub fn reset_position(&mut self) {
        self.position = 0;
    }

    /// Discards the first `n` bytes. Any slice obtained from
    /// `remaining_from_position`/`unconsumed` before this call must not be
    /// used afterwards — the borrow checker enforces this since `consume`
    /// requires `&mut self`.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.storage.len());
        self.storage.advance(n);
        self.position = self.position.saturating_sub(n);
    }

    /// Takes ownership of everything currently stored, leaving the buffer
    /// empty. Used by the Writer when handing a finished frame to the
    /// connection.
    pub fn take(&mut self) -> Bytes {
        self.position = 0;
        self.storage.split().freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_consume_shrinks_buffer() {
        let mut buf = ByteBuffer::new();
        buf.append(b"hello world");
        assert_eq!(buf.len(), 11);

        buf.consume(6);
        assert_eq!(buf.unconsumed(), b"world");
    }

    #[test]
    fn position_tracks_independent_of_consume() {
        let mut buf = ByteBuffer::new();
        buf.append(b"abcdef");
        buf.advance_position(4);
        assert_eq!(buf.position(), 4);
        assert_eq!(buf.remaining_from_position(), b"ef");

        buf.consume(2);
        assert_eq!(buf.position(), 2);
        assert_eq!(buf.remaining_from_position(), b"ef");
    }

    #[test]
    fn take_clears_storage_and_position() {
        let mut buf = ByteBuffer::new();
        buf.append(b"xyz");
        buf.advance_position(1);

        let taken = buf.take();
        assert_eq!(&taken[..], b"xyz");
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.position(), 0);
    }
}
