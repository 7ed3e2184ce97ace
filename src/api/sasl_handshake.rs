//! SaslHandshake, api_key=17, version=1 (pre-flex; no tagged fields anywhere
//! in this call). Negotiates the mechanism name before the SASL byte
//! exchange proper begins (spec.md §4.4).

use super::{top_level_error_locations, ApiDescriptor};
use crate::codec::{Reader, Writer};
use crate::error::{ErrorLocation, ProtocolCodecError};
use std::collections::BTreeMap;

pub struct SaslHandshakeRequest {
    pub mechanism: String,
}

#[derive(Debug, Clone)]
pub struct SaslHandshakeResponse {
    pub error_code: i16,
    pub mechanisms: Vec<String>,
}

pub struct SaslHandshake;

impl ApiDescriptor for SaslHandshake {
    type Request = SaslHandshakeRequest;
    type Response = SaslHandshakeResponse;

    const API_KEY: i16 = 17;
    const API_VERSION: i16 = 1;
    const NAME: &'static str = "SaslHandshake";
    const REQUEST_HEADER_FLEX: bool = false;
    const RESPONSE_HEADER_FLEX: bool = false;

    fn encode_body(request: &Self::Request) -> Writer {
        let mut writer = Writer::new();
        writer.append_string(Some(&request.mechanism), false);
        writer
    }

    fn parse_body(reader: &mut Reader) -> Result<Self::Response, ProtocolCodecError> {
        let error_code = reader.read_int16()?;
        let mechanisms = reader
            .read_array(false, false, |r| r.read_string(false))?
            .unwrap_or_default();
        Ok(SaslHandshakeResponse {
            error_code,
            mechanisms,
        })
    }

    fn error_locations(response: &Self::Response) -> BTreeMap<String, ErrorLocation> {
        top_level_error_locations(response.error_code, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_mechanism_lists_the_server_supported_set() {
        let mut writer = Writer::new();
        writer.append_int16(33); // UNSUPPORTED_SASL_MECHANISM
        writer.append_array(Some(&["PLAIN".to_string(), "SCRAM-SHA-256".to_string()][..]), false, false, |w, m| {
            w.append_string(Some(m), false);
        });
        let bytes = writer.into_bytes();
        let mut reader = Reader::new(&bytes);
        let response = SaslHandshake::parse_body(&mut reader).unwrap();
        assert_eq!(response.mechanisms, vec!["PLAIN", "SCRAM-SHA-256"]);
        assert_eq!(SaslHandshake::error_locations(&response)["/"].code, 33);
    }
}
