//! In-flight request record (runtime record inside the connection engine,
//! spec.md §3 "Request"). Holds enough to deliver exactly one completion
//! and nothing that could form a cycle back to the connection (spec.md §9
//! "Cyclic references avoided" -- the in-flight map holds the request, the
//! request holds a diagnostic context, never a handle back to `Connection`).

use crate::error::KafkaClientError;
use bytes::Bytes;
use std::time::Instant;
use tokio::sync::oneshot;

/// What the engine does once a response (or timeout) resolves an in-flight
/// correlation id. User-submitted requests and the engine's own SASL
/// handshake/re-auth traffic share the same in-flight map and demux path;
/// they differ only in how completion is delivered.
pub enum Completion {
    /// Hand the raw response body (header already stripped) back to the
    /// caller, who parses it with its own `ApiDescriptor::parse_body`. The
    /// correlation id rides along so a non-zero error-code response can be
    /// turned into a `ResponseError` without the caller tracking it itself.
    User(oneshot::Sender<Result<(i32, Bytes), KafkaClientError>>),
    /// Feed the raw response body into the SASL state machine driving the
    /// initial handshake or a re-authentication round.
    Sasl,
}

/// Diagnostic context carried alongside a request. Never read by the
/// connection itself outside of logging/error messages.
pub struct RequestContext {
    pub api_name: &'static str,
    pub api_key: i16,
    pub submitted_at: Instant,
}

pub struct InFlightRequest {
    pub context: RequestContext,
    pub resp_flex: bool,
    pub completion: Completion,
    pub timed_out: bool,
}

impl InFlightRequest {
    pub fn new(context: RequestContext, resp_flex: bool, completion: Completion) -> Self {
        Self {
            context,
            resp_flex,
            completion,
            timed_out: false,
        }
    }

    /// Delivers `result` to whichever completion this request holds.
    /// Consumes `self`; per spec.md §8, exactly one callback invocation
    /// occurs per request, and this is the only place that happens.
    pub fn complete(
        self,
        correlation_id: i32,
        result: Result<Bytes, KafkaClientError>,
    ) -> Option<Result<Bytes, KafkaClientError>> {
        match self.completion {
            Completion::User(sender) => {
                // The receiver may already be gone if the caller dropped
                // the future; that's not an error, just a lost delivery.
                let _ = sender.send(result.map(|body| (correlation_id, body)));
                None
            }
            Completion::Sasl => Some(result),
        }
    }

    /// Fires a timeout error without removing the request from the
    /// in-flight map — spec.md §4.6 leaves the entry in place so a late
    /// response can still be matched and silently discarded. Replaces
    /// `completion` with an inert placeholder since it has now been used;
    /// `timed_out` is what guards against acting on the entry again.
    pub fn fire_timeout(&mut self, err: KafkaClientError) -> Option<Result<Bytes, KafkaClientError>> {
        self.timed_out = true;
        match std::mem::replace(&mut self.completion, Completion::Sasl) {
            Completion::User(sender) => {
                let _ = sender.send(Err(err));
                None
            }
            Completion::Sasl => Some(Err(err)),
        }
    }
}
