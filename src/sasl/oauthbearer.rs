//! SASL/OAUTHBEARER (RFC 7628 as adapted by Kafka): bytes formatted as
//! `n,a=<user>,\x01auth=Bearer <token>\x01<ext_k>=<ext_v>\x01…\x01\x01`
//! (spec.md §4.4). One round trip.

use super::{SaslMechanism, SaslOutcome};
use crate::error::KafkaClientError;
use std::collections::BTreeMap;

pub struct OAuthBearerMechanism {
    username: String,
    token: String,
    extensions: BTreeMap<String, String>,
}

impl OAuthBearerMechanism {
    pub fn new(username: String, token: String, extensions: BTreeMap<String, String>) -> Self {
        Self {
            username,
            token,
            extensions,
        }
    }
}

impl SaslMechanism for OAuthBearerMechanism {
    fn name(&self) -> &'static str {
        "OAUTHBEARER"
    }

    fn step(&mut self, _server_message: Option<&[u8]>) -> Result<SaslOutcome, KafkaClientError> {
        let mut message = format!("n,a={},", self.username);
        message.push('\x01');
        message.push_str("auth=Bearer ");
        message.push_str(&self.token);
        message.push('\x01');
        for (key, value) in &self.extensions {
            message.push_str(key);
            message.push('=');
            message.push_str(value);
            message.push('\x01');
        }
        message.push('\x01');
        Ok(SaslOutcome::Complete(message.into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bearer_token_with_control_a_separators() {
        let mut extensions = BTreeMap::new();
        extensions.insert("tenant".to_string(), "acme".to_string());
        let mut mechanism =
            OAuthBearerMechanism::new("alice".to_string(), "tok123".to_string(), extensions);

        let SaslOutcome::Complete(bytes) = mechanism.step(None).unwrap() else {
            panic!("OAUTHBEARER must complete in one step");
        };
        let message = String::from_utf8(bytes).unwrap();
        assert_eq!(message, "n,a=alice,\x01auth=Bearer tok123\x01tenant=acme\x01\x01");
    }
}
