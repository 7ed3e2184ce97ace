//! GSSAPI is not implemented in-core. Selecting it without a pluggable
//! authenticator hook (`SaslCredentials::Custom`) surfaces the same message
//! the source library does (spec.md §4.4).

use super::{SaslMechanism, SaslOutcome};
use crate::error::KafkaClientError;

#[derive(Default)]
pub struct GssapiMechanism;

impl SaslMechanism for GssapiMechanism {
    fn name(&self) -> &'static str {
        "GSSAPI"
    }

    fn step(&mut self, _server_message: Option<&[u8]>) -> Result<SaslOutcome, KafkaClientError> {
        Err(KafkaClientError::Authentication {
            mechanism: "GSSAPI".to_string(),
            reason: "no custom SASL/GSSAPI authenticator provided".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gssapi_without_a_hook_fails_immediately() {
        let mut mechanism = GssapiMechanism;
        let err = mechanism.step(None).unwrap_err();
        assert!(matches!(err, KafkaClientError::Authentication { .. }));
    }
}
