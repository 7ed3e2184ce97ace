//! The binary codec: a symmetrical Writer/Reader pair (components B and C)
//! speaking the Kafka wire vocabulary over a growable buffer (component A,
//! [`crate::buffer::ByteBuffer`]).

pub mod reader;
pub mod tagged_fields;
pub mod varint;
pub mod writer;

pub use reader::Reader;
pub use writer::{Writer, WriterContext};
