//! SASL engines (component E): PLAIN, SCRAM-SHA-256/512, OAUTHBEARER, and a
//! GSSAPI stub, each a small state machine driven through `SaslAuthenticate`
//! calls (spec.md §4.4). The connection engine (component F) owns the
//! handshake loop; mechanisms only produce/consume opaque byte payloads.

mod gssapi;
mod oauthbearer;
mod plain;
mod scram;

pub use gssapi::GssapiMechanism;
pub use oauthbearer::OAuthBearerMechanism;
pub use plain::PlainMechanism;
pub use scram::{ScramSha256Mechanism, ScramSha512Mechanism};

use crate::error::KafkaClientError;
use std::collections::BTreeMap;
use std::sync::Arc;

/// What a mechanism wants the connection engine to do next.
pub enum SaslOutcome {
    /// Send `0` as the next `SaslAuthenticate` request; the broker's reply
    /// must be fed back into another call to [`SaslMechanism::step`].
    Continue(Vec<u8>),
    /// Send this payload as the mechanism's last client message. The
    /// broker's reply to it is handed to [`SaslMechanism::verify_final`]
    /// rather than `step`.
    Complete(Vec<u8>),
}

/// Common contract every SASL mechanism implements (spec.md §4.4).
pub trait SaslMechanism: Send {
    fn name(&self) -> &'static str;

    /// `server_message` is `None` for the very first call, and `Some` for
    /// every subsequent call after a `Continue` outcome.
    fn step(&mut self, server_message: Option<&[u8]>) -> Result<SaslOutcome, KafkaClientError>;

    /// Called once, after the broker's reply to the mechanism's final
    /// (`Complete`) message arrives. Mechanisms that need to validate a
    /// server-sent proof (SCRAM) override this; stateless mechanisms accept
    /// the default no-op.
    fn verify_final(&mut self, _final_server_message: &[u8]) -> Result<(), KafkaClientError> {
        Ok(())
    }
}

/// Credentials/configuration a caller supplies to select and parameterize a
/// mechanism (spec.md §6 "SASL options"). Cheaply `Clone` (an `Arc` factory
/// in the `Custom` case) since re-authentication builds a fresh mechanism
/// instance for every round, including the initial one.
#[derive(Clone)]
pub enum SaslCredentials {
    Plain {
        username: String,
        password: String,
    },
    ScramSha256 {
        username: String,
        password: String,
    },
    ScramSha512 {
        username: String,
        password: String,
    },
    OAuthBearer {
        username: String,
        token: String,
        extensions: BTreeMap<String, String>,
    },
    /// No built-in GSSAPI implementation; the caller may supply a pluggable
    /// hook instead (spec.md §4.4).
    Gssapi,
    /// A caller-supplied authenticator factory, for mechanisms this crate
    /// does not implement in-core. A factory rather than a bare instance so
    /// re-authentication can build a fresh mechanism each round.
    Custom(Arc<dyn Fn() -> Box<dyn SaslMechanism> + Send + Sync>),
}

impl std::fmt::Debug for SaslCredentials {
    /// Deliberately omits username/password/token payloads.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaslCredentials")
            .field("mechanism", &self.mechanism_name())
            .finish()
    }
}

impl SaslCredentials {
    pub fn mechanism_name(&self) -> &'static str {
        match self {
            SaslCredentials::Plain { .. } => "PLAIN",
            SaslCredentials::ScramSha256 { .. } => "SCRAM-SHA-256",
            SaslCredentials::ScramSha512 { .. } => "SCRAM-SHA-512",
            SaslCredentials::OAuthBearer { .. } => "OAUTHBEARER",
            SaslCredentials::Gssapi => "GSSAPI",
            SaslCredentials::Custom(_) => "CUSTOM",
        }
    }

    /// Builds a fresh mechanism state machine to drive one `SaslAuthenticate`
    /// exchange. Called once per (re)authentication.
    pub fn build_mechanism(&self) -> Box<dyn SaslMechanism> {
        match self {
            SaslCredentials::Plain { username, password } => {
                Box::new(PlainMechanism::new(username.clone(), password.clone()))
            }
            SaslCredentials::ScramSha256 { username, password } => {
                Box::new(ScramSha256Mechanism::new(username.clone(), password.clone()))
            }
            SaslCredentials::ScramSha512 { username, password } => {
                Box::new(ScramSha512Mechanism::new(username.clone(), password.clone()))
            }
            SaslCredentials::OAuthBearer {
                username,
                token,
                extensions,
            } => Box::new(OAuthBearerMechanism::new(
                username.clone(),
                token.clone(),
                extensions.clone(),
            )),
            SaslCredentials::Gssapi => Box::new(GssapiMechanism::default()),
            SaslCredentials::Custom(factory) => factory(),
        }
    }
}
