//! Frame accumulator and demultiplexer (component F's response half,
//! spec.md §4.6). Owns exactly the bytes received but not yet parsed, plus
//! the `expected_next_frame` length once the leading `int32` has been read.
//! Framing is `int32 total_length | int32 correlation_id | body` (spec.md
//! §6); this module strips both integers and hands back `body` starting
//! right after the correlation id.

use crate::buffer::ByteBuffer;
use crate::error::ProtocolCodecError;
use bytes::Bytes;

pub struct Frame {
    pub correlation_id: i32,
    pub body: Bytes,
}

#[derive(Default)]
pub struct FrameAccumulator {
    buffer: ByteBuffer,
    expected_next_frame: Option<i32>,
}

impl FrameAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.buffer.append(bytes);
    }

    /// Returns the next complete frame, if one has fully arrived. Call in a
    /// loop after every socket read -- a single read can contain zero,
    /// one, or several whole frames (spec.md §8 scenario "frame split over
    /// two reads" is the zero/partial case; pipelined responses are the
    /// several-at-once case).
    pub fn next_frame(&mut self) -> Result<Option<Frame>, ProtocolCodecError> {
        if self.expected_next_frame.is_none() {
            if self.buffer.unconsumed().len() < 4 {
                return Ok(None);
            }
            let length = i32::from_be_bytes(self.buffer.unconsumed()[0..4].try_into().unwrap());
            if length < 4 {
                return Err(ProtocolCodecError::InvalidLength {
                    length: length as i64,
                });
            }
            self.expected_next_frame = Some(length);
        }

        let frame_len = self.expected_next_frame.expect("checked above") as usize;
        let total = frame_len + 4;
        if self.buffer.unconsumed().len() < total {
            return Ok(None);
        }

        let correlation_id =
            i32::from_be_bytes(self.buffer.unconsumed()[4..8].try_into().unwrap());
        let body = Bytes::copy_from_slice(&self.buffer.unconsumed()[8..total]);
        self.buffer.consume(total);
        self.expected_next_frame = None;
        Ok(Some(Frame {
            correlation_id,
            body,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_bytes(correlation_id: i32, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let length = 4 + body.len() as i32;
        out.extend_from_slice(&length.to_be_bytes());
        out.extend_from_slice(&correlation_id.to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn frame_split_over_two_reads() {
        let full = frame_bytes(7, b"hello-world-body");
        let mut accumulator = FrameAccumulator::new();

        accumulator.append(&full[0..6]);
        assert!(accumulator.next_frame().unwrap().is_none());

        accumulator.append(&full[6..]);
        let frame = accumulator.next_frame().unwrap().unwrap();
        assert_eq!(frame.correlation_id, 7);
        assert_eq!(&frame.body[..], b"hello-world-body");
        assert!(accumulator.next_frame().unwrap().is_none());
    }

    #[test]
    fn two_pipelined_frames_in_one_read() {
        let mut bytes = frame_bytes(1, b"first");
        bytes.extend(frame_bytes(2, b"second"));
        let mut accumulator = FrameAccumulator::new();
        accumulator.append(&bytes);

        let first = accumulator.next_frame().unwrap().unwrap();
        assert_eq!(first.correlation_id, 1);
        let second = accumulator.next_frame().unwrap().unwrap();
        assert_eq!(second.correlation_id, 2);
        assert!(accumulator.next_frame().unwrap().is_none());
    }

    #[test]
    fn length_below_four_is_a_protocol_error() {
        let mut accumulator = FrameAccumulator::new();
        accumulator.append(&2i32.to_be_bytes());
        assert!(matches!(
            accumulator.next_frame(),
            Err(ProtocolCodecError::InvalidLength { length: 2 })
        ));
    }
}
