//! SASL/PLAIN: a single `SaslAuthenticate` round trip with bytes
//! `\0<username>\0<password>` (spec.md §4.4).

use super::{SaslMechanism, SaslOutcome};
use crate::error::KafkaClientError;

pub struct PlainMechanism {
    username: String,
    password: String,
}

impl PlainMechanism {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }
}

impl SaslMechanism for PlainMechanism {
    fn name(&self) -> &'static str {
        "PLAIN"
    }

    fn step(&mut self, _server_message: Option<&[u8]>) -> Result<SaslOutcome, KafkaClientError> {
        let mut message = Vec::with_capacity(self.username.len() + self.password.len() + 2);
        message.push(0u8);
        message.extend_from_slice(self.username.as_bytes());
        message.push(0u8);
        message.extend_from_slice(self.password.as_bytes());
        Ok(SaslOutcome::Complete(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_round_trip_with_null_separated_credentials() {
        let mut mechanism = PlainMechanism::new("u".to_string(), "p".to_string());
        match mechanism.step(None).unwrap() {
            SaslOutcome::Complete(bytes) => assert_eq!(bytes, b"\0u\0p"),
            SaslOutcome::Continue(_) => panic!("PLAIN must complete in one step"),
        }
    }
}
