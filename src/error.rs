//! Crate-wide error taxonomy.
//!
//! Two layers, following the teacher's split of a narrow codec-local error
//! (`src/protocol/errors.rs`'s `ProtocolError`) from the broader
//! application error exposed at the edges (`anyhow::Result` in
//! `src/kafka/broker.rs`/`src/network/server.rs`): [`ProtocolCodecError`]
//! is what [`crate::codec::Reader`]/[`crate::codec::Writer`] raise, and
//! [`KafkaClientError`] is what the connection engine surfaces to callers,
//! wrapping a `ProtocolCodecError` as one of its variants.

use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the binary codec (component B/C). These never cross a
/// socket boundary on their own — the connection engine wraps them in
/// [`KafkaClientError::Protocol`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolCodecError {
    #[error("insufficient bytes: expected at least {expected}, found {actual}")]
    InsufficientBytes { expected: usize, actual: usize },

    #[error("invalid length field: {length}")]
    InvalidLength { length: i64 },

    #[error("invalid utf-8 in string field: {0}")]
    InvalidUtf8(String),

    #[error("string or bytes field too long: {length} exceeds maximum {max}")]
    TooLong { length: usize, max: usize },

    #[error("malformed varint (missing terminator or overflow)")]
    InvalidVarint,

    #[error("invalid uuid representation: {0}")]
    InvalidUuid(String),

    #[error("null value supplied for non-nullable field {field}")]
    UnexpectedNull { field: &'static str },
}

impl ProtocolCodecError {
    pub fn insufficient_bytes(expected: usize, actual: usize) -> Self {
        Self::InsufficientBytes { expected, actual }
    }
}

/// One element of a [`KafkaClientError::Response`] location map: the
/// non-zero error code Kafka returned for that element, plus its optional
/// human-readable message field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLocation {
    pub code: i16,
    pub message: Option<String>,
}

/// A response whose elements carried non-zero error codes. Generic over the
/// descriptor's own response type `R` so callers get the fully parsed body
/// back without a fallible downcast (see SPEC_FULL.md §11, Open Question 2).
#[derive(Debug, Clone)]
pub struct ResponseError<R> {
    pub api_key: i16,
    pub api_name: &'static str,
    pub correlation_id: i32,
    /// JSON-pointer-style path (e.g. `/topics/1`) -> error location.
    pub locations: BTreeMap<String, ErrorLocation>,
    pub response: R,
}

impl<R> std::fmt::Display for ResponseError<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (correlation_id={}) returned {} element error(s): ",
            self.api_name,
            self.correlation_id,
            self.locations.len()
        )?;
        for (path, loc) in &self.locations {
            write!(f, "{path}=code {}", loc.code)?;
            if let Some(message) = &loc.message {
                write!(f, " ({message})")?;
            }
            write!(f, "; ")?;
        }
        Ok(())
    }
}

/// Per-`send` result: either the clean response, or a [`KafkaClientError`]
/// that, for the `Response` case, still carries the typed `R`.
pub type SendResult<R> = Result<R, SendError<R>>;

/// Wraps [`KafkaClientError`] for API calls that know their own response
/// type, so `SendError::Response` carries a typed [`ResponseError<R>`]
/// instead of the type-erased form on [`KafkaClientError`].
#[derive(Error, Debug)]
pub enum SendError<R> {
    #[error(transparent)]
    Client(#[from] KafkaClientError),
    #[error(transparent)]
    Response(ResponseError<R>),
}

impl<R: std::fmt::Debug> std::fmt::Display for ResponseErrorBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Object-safe view of a [`ResponseError<R>`] so [`KafkaClientError`] (which
/// is not generic) can still carry response-level error information when an
/// API call is driven through a non-generic path (e.g. logging).
pub trait ResponseErrorInfo: std::fmt::Debug + std::fmt::Display + Send + Sync {
    fn api_name(&self) -> &'static str;
    fn locations(&self) -> &BTreeMap<String, ErrorLocation>;
}

impl<R: std::fmt::Debug + Send + Sync> ResponseErrorInfo for ResponseError<R> {
    fn api_name(&self) -> &'static str {
        self.api_name
    }

    fn locations(&self) -> &BTreeMap<String, ErrorLocation> {
        &self.locations
    }
}

/// A type-erased wrapper so `Box<dyn ResponseErrorInfo>` implements
/// `Display` through the inner value (used only for the non-generic
/// `KafkaClientError::Response` variant).
#[derive(Debug)]
pub struct ResponseErrorBox(pub Box<dyn ResponseErrorInfo>);

/// The connection engine's top-level error type, matching the taxonomy in
/// spec.md §4.7/§7.
#[derive(Error, Debug)]
pub enum KafkaClientError {
    #[error("network error talking to {host}:{port}: {source}")]
    Network {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("connection to {host}:{port} is closed")]
    ConnectionClosed { host: String, port: u16 },

    #[error("received response with unknown correlation id {correlation_id}")]
    UnexpectedCorrelationId { correlation_id: i32 },

    #[error("connect to {host}:{port} timed out after {after:?}")]
    ConnectTimeout {
        host: String,
        port: u16,
        after: Duration,
    },

    #[error("request {api_name} (correlation_id={correlation_id}) timed out after {after:?}")]
    RequestTimeout {
        api_name: &'static str,
        correlation_id: i32,
        after: Duration,
    },

    #[error("SASL authentication failed ({mechanism}): {reason}")]
    Authentication { mechanism: String, reason: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolCodecError),

    #[error("{0}")]
    Response(ResponseErrorBox),

    #[error("invalid use of the API: {message}")]
    User { message: String },
}

impl KafkaClientError {
    pub fn network(host: impl Into<String>, port: u16, source: std::io::Error) -> Self {
        Self::Network {
            host: host.into(),
            port,
            source,
        }
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}

impl<R> From<ResponseError<R>> for SendError<R> {
    fn from(value: ResponseError<R>) -> Self {
        SendError::Response(value)
    }
}

impl<R: std::fmt::Debug + Send + Sync + 'static> SendError<R> {
    /// Collapses the typed `R` into the crate's non-generic error type,
    /// boxing a `Response` variant behind [`ResponseErrorInfo`]. Used at call
    /// sites (e.g. the SASL handshake loop) that only need to propagate the
    /// failure, not inspect the typed response body.
    pub fn into_client_error(self) -> KafkaClientError {
        match self {
            SendError::Client(error) => error,
            SendError::Response(response_error) => {
                KafkaClientError::Response(ResponseErrorBox(Box::new(response_error)))
            }
        }
    }
}
