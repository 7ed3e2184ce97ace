//! SASL/SCRAM-SHA-256 and SCRAM-SHA-512 (RFC 5802, as adapted by Kafka):
//! client-first -> server-first -> client-final -> server-final, per
//! spec.md §4.4. `ScramHash` dispatches the handful of hash-specific
//! primitives (HMAC, digest, PBKDF2) so the exchange logic itself lives
//! once in [`ScramState`].

use super::{SaslMechanism, SaslOutcome};
use crate::error::KafkaClientError;
use base64::Engine;
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};

const CHANNEL_BINDING: &str = "biws"; // base64("n,,")
const MIN_ITERATIONS: u32 = 4096;
const NONCE_BYTES: usize = 24;

#[derive(Clone, Copy)]
enum ScramHash {
    Sha256,
    Sha512,
}

impl ScramHash {
    fn name(self) -> &'static str {
        match self {
            ScramHash::Sha256 => "SCRAM-SHA-256",
            ScramHash::Sha512 => "SCRAM-SHA-512",
        }
    }

    fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            ScramHash::Sha256 => Sha256::digest(data).to_vec(),
            ScramHash::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    fn hmac(self, key: &[u8], data: &[u8]) -> Vec<u8> {
        match self {
            ScramHash::Sha256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("hmac accepts any key length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            ScramHash::Sha512 => {
                let mut mac = Hmac::<Sha512>::new_from_slice(key).expect("hmac accepts any key length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
        }
    }

    fn pbkdf2(self, password: &[u8], salt: &[u8], iterations: u32) -> Vec<u8> {
        match self {
            ScramHash::Sha256 => {
                let mut out = vec![0u8; 32];
                pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out);
                out
            }
            ScramHash::Sha512 => {
                let mut out = vec![0u8; 64];
                pbkdf2_hmac::<Sha512>(password, salt, iterations, &mut out);
                out
            }
        }
    }
}

fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect()
}

/// Escapes `,` and `=` per RFC 5802 §5.1 so usernames can appear in the
/// `n=...` attribute safely.
fn saslname_escape(name: &str) -> String {
    name.replace('=', "=3D").replace(',', "=2C")
}

enum ScramState {
    Initial,
    WaitingServerFirst { client_first_bare: String },
    WaitingServerFinal { expected_server_signature: Vec<u8> },
    Done,
}

pub struct ScramMechanism {
    hash: ScramHash,
    username: String,
    password: String,
    client_nonce: String,
    state: ScramState,
}

impl ScramMechanism {
    fn new(hash: ScramHash, username: String, password: String) -> Self {
        let mut nonce_bytes = [0u8; NONCE_BYTES];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let client_nonce = base64::engine::general_purpose::STANDARD.encode(nonce_bytes);

        Self {
            hash,
            username,
            password,
            client_nonce,
            state: ScramState::Initial,
        }
    }

    fn parse_server_message(message: &str) -> std::collections::HashMap<char, String> {
        message
            .split(',')
            .filter_map(|attr| {
                let mut parts = attr.splitn(2, '=');
                let key = parts.next()?.chars().next()?;
                let value = parts.next()?.to_string();
                Some((key, value))
            })
            .collect()
    }
}

impl SaslMechanism for ScramMechanism {
    fn name(&self) -> &'static str {
        self.hash.name()
    }

    fn step(&mut self, server_message: Option<&[u8]>) -> Result<SaslOutcome, KafkaClientError> {
        match (&self.state, server_message) {
            (ScramState::Initial, None) => {
                let client_first_bare = format!(
                    "n={},r={}",
                    saslname_escape(&self.username),
                    self.client_nonce
                );
                let client_first = format!("n,,{client_first_bare}");
                self.state = ScramState::WaitingServerFirst { client_first_bare };
                Ok(SaslOutcome::Continue(client_first.into_bytes()))
            }
            (ScramState::WaitingServerFirst { client_first_bare }, Some(server_first)) => {
                let server_first_str = std::str::from_utf8(server_first).map_err(|_| {
                    KafkaClientError::Authentication {
                        mechanism: self.hash.name().to_string(),
                        reason: "server-first message was not valid utf-8".to_string(),
                    }
                })?;
                let attrs = Self::parse_server_message(server_first_str);
                let auth_error = |reason: &str| KafkaClientError::Authentication {
                    mechanism: self.hash.name().to_string(),
                    reason: reason.to_string(),
                };

                let combined_nonce = attrs.get(&'r').ok_or_else(|| auth_error("server-first missing nonce"))?;
                if !combined_nonce.starts_with(&self.client_nonce) {
                    return Err(auth_error("server nonce does not extend the client nonce"));
                }

                let salt_b64 = attrs.get(&'s').ok_or_else(|| auth_error("server-first missing salt"))?;
                let salt = base64::engine::general_purpose::STANDARD
                    .decode(salt_b64)
                    .map_err(|_| auth_error("server-first salt is not valid base64"))?;

                let iterations: u32 = attrs
                    .get(&'i')
                    .ok_or_else(|| auth_error("server-first missing iteration count"))?
                    .parse()
                    .map_err(|_| auth_error("server-first iteration count is not a number"))?;
                if iterations < MIN_ITERATIONS {
                    return Err(auth_error("server-first iteration count is below the accepted minimum"));
                }

                let client_final_without_proof = format!("c={CHANNEL_BINDING},r={combined_nonce}");
                let auth_message =
                    format!("{client_first_bare},{server_first_str},{client_final_without_proof}");

                let salted_password = self.hash.pbkdf2(self.password.as_bytes(), &salt, iterations);
                let client_key = self.hash.hmac(&salted_password, b"Client Key");
                let server_key = self.hash.hmac(&salted_password, b"Server Key");
                let stored_key = self.hash.digest(&client_key);
                let client_signature = self.hash.hmac(&stored_key, auth_message.as_bytes());
                let server_signature = self.hash.hmac(&server_key, auth_message.as_bytes());
                let client_proof = xor(&client_key, &client_signature);

                let client_final = format!(
                    "{client_final_without_proof},p={}",
                    base64::engine::general_purpose::STANDARD.encode(client_proof)
                );

                self.state = ScramState::WaitingServerFinal {
                    expected_server_signature: server_signature,
                };
                Ok(SaslOutcome::Complete(client_final.into_bytes()))
            }
            _ => Err(KafkaClientError::Authentication {
                mechanism: self.hash.name().to_string(),
                reason: "SCRAM step called out of sequence".to_string(),
            }),
        }
    }

    fn verify_final(&mut self, final_server_message: &[u8]) -> Result<(), KafkaClientError> {
        let ScramState::WaitingServerFinal {
            expected_server_signature,
        } = &self.state
        else {
            return Err(KafkaClientError::Authentication {
                mechanism: self.hash.name().to_string(),
                reason: "verify_final called before client-final was sent".to_string(),
            });
        };

        let message = std::str::from_utf8(final_server_message).map_err(|_| {
            KafkaClientError::Authentication {
                mechanism: self.hash.name().to_string(),
                reason: "server-final message was not valid utf-8".to_string(),
            }
        })?;
        let attrs = Self::parse_server_message(message);
        let auth_error = |reason: &str| KafkaClientError::Authentication {
            mechanism: self.hash.name().to_string(),
            reason: reason.to_string(),
        };

        let signature_b64 = attrs
            .get(&'v')
            .ok_or_else(|| auth_error("server-final missing signature"))?;
        let received_signature = base64::engine::general_purpose::STANDARD
            .decode(signature_b64)
            .map_err(|_| auth_error("server-final signature is not valid base64"))?;

        if &received_signature != expected_server_signature {
            return Err(auth_error("server signature did not match"));
        }

        self.state = ScramState::Done;
        Ok(())
    }
}

pub struct ScramSha256Mechanism(ScramMechanism);

impl ScramSha256Mechanism {
    pub fn new(username: String, password: String) -> Self {
        Self(ScramMechanism::new(ScramHash::Sha256, username, password))
    }
}

impl SaslMechanism for ScramSha256Mechanism {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn step(&mut self, server_message: Option<&[u8]>) -> Result<SaslOutcome, KafkaClientError> {
        self.0.step(server_message)
    }

    fn verify_final(&mut self, final_server_message: &[u8]) -> Result<(), KafkaClientError> {
        self.0.verify_final(final_server_message)
    }
}

pub struct ScramSha512Mechanism(ScramMechanism);

impl ScramSha512Mechanism {
    pub fn new(username: String, password: String) -> Self {
        Self(ScramMechanism::new(ScramHash::Sha512, username, password))
    }
}

impl SaslMechanism for ScramSha512Mechanism {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn step(&mut self, server_message: Option<&[u8]>) -> Result<SaslOutcome, KafkaClientError> {
        self.0.step(server_message)
    }

    fn verify_final(&mut self, final_server_message: &[u8]) -> Result<(), KafkaClientError> {
        self.0.verify_final(final_server_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drives a full client/server exchange in-process using the textbook
    /// RFC 5802 server-side math, to exercise the client state machine
    /// end-to-end without a real broker.
    #[test]
    fn full_exchange_succeeds_with_a_matching_server() {
        let hash = ScramHash::Sha256;
        let username = "user".to_string();
        let password = "pencil".to_string();
        let salt = b"fake-salt".to_vec();
        let iterations = MIN_ITERATIONS;

        let mut client = ScramSha256Mechanism::new(username.clone(), password.clone());

        let SaslOutcome::Continue(client_first) = client.step(None).unwrap() else {
            panic!("first step must continue");
        };
        let client_first_str = String::from_utf8(client_first).unwrap();
        let client_first_bare = client_first_str.strip_prefix("n,,").unwrap().to_string();
        let client_nonce = client.0.client_nonce.clone();

        let server_nonce = format!("{client_nonce}server-part");
        let server_first = format!(
            "r={},s={},i={}",
            server_nonce,
            base64::engine::general_purpose::STANDARD.encode(&salt),
            iterations
        );

        let SaslOutcome::Complete(client_final) =
            client.step(Some(server_first.as_bytes())).unwrap()
        else {
            panic!("second step must complete");
        };
        let client_final_str = String::from_utf8(client_final).unwrap();

        let client_final_without_proof = format!("c={CHANNEL_BINDING},r={server_nonce}");
        let auth_message = format!("{client_first_bare},{server_first},{client_final_without_proof}");

        let salted_password = hash.pbkdf2(password.as_bytes(), &salt, iterations);
        let client_key = hash.hmac(&salted_password, b"Client Key");
        let server_key = hash.hmac(&salted_password, b"Server Key");
        let stored_key = hash.digest(&client_key);
        let client_signature = hash.hmac(&stored_key, auth_message.as_bytes());
        let server_signature = hash.hmac(&server_key, auth_message.as_bytes());
        let expected_proof = xor(&client_key, &client_signature);
        let expected_final = format!(
            "{client_final_without_proof},p={}",
            base64::engine::general_purpose::STANDARD.encode(&expected_proof)
        );
        assert_eq!(client_final_str, expected_final);

        let server_final = format!(
            "v={}",
            base64::engine::general_purpose::STANDARD.encode(&server_signature)
        );
        client.verify_final(server_final.as_bytes()).unwrap();
    }

    #[test]
    fn mismatched_server_signature_is_rejected() {
        let mut client = ScramSha256Mechanism::new("user".to_string(), "pencil".to_string());
        let client_nonce = client.0.client_nonce.clone();
        client.step(None).unwrap();
        let server_first = format!(
            "r={client_nonce}x,s={},i=4096",
            base64::engine::general_purpose::STANDARD.encode(b"salt")
        );
        client.step(Some(server_first.as_bytes())).unwrap();

        let bogus = format!(
            "v={}",
            base64::engine::general_purpose::STANDARD.encode(b"not-the-real-signature")
        );
        assert!(client.verify_final(bogus.as_bytes()).is_err());
    }

    #[test]
    fn server_nonce_must_extend_client_nonce() {
        let mut client = ScramSha256Mechanism::new("user".to_string(), "pencil".to_string());
        client.step(None).unwrap();
        let server_first = format!(
            "r=totally-different-nonce,s={},i=4096",
            base64::engine::general_purpose::STANDARD.encode(b"salt")
        );
        assert!(client.step(Some(server_first.as_bytes())).is_err());
    }
}
