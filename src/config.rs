//! Typed configuration surface for [`crate::connection::Connection`].
//! Builder-by-struct-update, following the teacher's `LogConfig` style
//! (`src/logging/mod.rs`), plus environment overrides under the same
//! `KAFKA_*` convention the teacher uses for its logging config.

use crate::sasl::SaslCredentials;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsVerifyMode {
    /// Validate the server certificate against `ca_certs` (or the platform
    /// trust store if empty) and check the hostname.
    Full,
    /// Validate the certificate chain but skip hostname verification.
    NoHostnameCheck,
    /// Accept any certificate. Never use this outside local testing.
    Insecure,
}

#[derive(Debug, Clone)]
pub struct TlsOptions {
    pub server_name: String,
    pub verify: TlsVerifyMode,
    /// PEM-encoded CA certificates. Empty means "use the platform trust store".
    pub ca_certs: Vec<Vec<u8>>,
}

impl TlsOptions {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            verify: TlsVerifyMode::Full,
            ca_certs: Vec::new(),
        }
    }

    pub fn with_verify(mut self, verify: TlsVerifyMode) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_ca_cert_pem(mut self, pem: Vec<u8>) -> Self {
        self.ca_certs.push(pem);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SaslOptions {
    pub credentials: SaslCredentials,
}

impl SaslOptions {
    pub fn new(credentials: SaslCredentials) -> Self {
        Self { credentials }
    }
}

/// Connection-level configuration. Defaults match spec.md §6's
/// environment-visible defaults exactly (5s connect, 30s request, 5 in-flight).
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_inflights: usize,
    pub backpressure: bool,
    pub client_id: Option<String>,
    pub tls: Option<TlsOptions>,
    pub sasl: Option<SaslOptions>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(5_000),
            request_timeout: Duration::from_millis(30_000),
            max_inflights: 5,
            backpressure: true,
            client_id: None,
            tls: None,
            sasl: None,
        }
    }
}

impl ConnectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_inflights(mut self, max_inflights: usize) -> Self {
        self.max_inflights = max_inflights;
        self
    }

    pub fn with_backpressure(mut self, enabled: bool) -> Self {
        self.backpressure = enabled;
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_tls(mut self, tls: TlsOptions) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn with_sasl(mut self, sasl: SaslOptions) -> Self {
        self.sasl = Some(sasl);
        self
    }

    /// Overlays `KAFKA_CONNECT_TIMEOUT_MS` / `KAFKA_REQUEST_TIMEOUT_MS` /
    /// `KAFKA_MAX_INFLIGHTS` on top of the struct's current values. Malformed
    /// values are ignored, keeping whatever was already set.
    pub fn from_env(mut self) -> Self {
        if let Some(ms) = env_u64("KAFKA_CONNECT_TIMEOUT_MS") {
            self.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("KAFKA_REQUEST_TIMEOUT_MS") {
            self.request_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = env_u64("KAFKA_MAX_INFLIGHTS") {
            self.max_inflights = n as usize;
        }
        self
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let options = ConnectionOptions::default();
        assert_eq!(options.connect_timeout, Duration::from_millis(5_000));
        assert_eq!(options.request_timeout, Duration::from_millis(30_000));
        assert_eq!(options.max_inflights, 5);
        assert!(options.backpressure);
    }

    #[test]
    fn builder_methods_chain() {
        let options = ConnectionOptions::new()
            .with_max_inflights(10)
            .with_client_id("test-client");
        assert_eq!(options.max_inflights, 10);
        assert_eq!(options.client_id.as_deref(), Some("test-client"));
    }
}
