//! Core Kafka wire-protocol codec and connection engine.
//!
//! Layered bottom-up: [`buffer`] is the shared growable byte buffer,
//! [`codec`] is the typed binary encoder/decoder pair built on it, [`api`]
//! is the catalog of request/response descriptors each binding a fixed
//! `(api_key, api_version)` to that codec, [`sasl`] is the set of
//! authentication mechanisms, and [`connection`] is the engine that drives
//! a socket, demultiplexes responses, and runs the SASL/re-auth state
//! machine on top of all of it. [`config`] and [`error`] are the shared
//! configuration and error types every layer above `codec` depends on.

pub mod api;
pub mod buffer;
pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod sasl;

pub use buffer::ByteBuffer;
pub use codec::{Reader, Writer, WriterContext};
pub use config::{ConnectionOptions, SaslOptions, TlsOptions, TlsVerifyMode};
pub use connection::{Connection, ConnectionStatus};
pub use error::{KafkaClientError, ResponseError, SendError, SendResult};
pub use sasl::SaslCredentials;
