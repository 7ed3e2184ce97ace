//! SaslAuthenticate, api_key=36, version=2 (flex). Carries the raw mechanism
//! bytes `SaslMechanism::step` produces; `session_lifetime_ms` feeds the
//! connection engine's re-authentication timer (spec.md §4.4, §4.7).

use super::{top_level_error_locations, ApiDescriptor};
use crate::codec::{Reader, Writer};
use crate::error::{ErrorLocation, ProtocolCodecError};
use std::collections::BTreeMap;

pub struct SaslAuthenticateRequest {
    pub auth_bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct SaslAuthenticateResponse {
    pub error_code: i16,
    pub error_message: Option<String>,
    pub auth_bytes: Vec<u8>,
    pub session_lifetime_ms: i64,
}

pub struct SaslAuthenticate;

impl ApiDescriptor for SaslAuthenticate {
    type Request = SaslAuthenticateRequest;
    type Response = SaslAuthenticateResponse;

    const API_KEY: i16 = 36;
    const API_VERSION: i16 = 2;
    const NAME: &'static str = "SaslAuthenticate";
    const REQUEST_HEADER_FLEX: bool = true;
    const RESPONSE_HEADER_FLEX: bool = true;

    fn encode_body(request: &Self::Request) -> Writer {
        let mut writer = Writer::new();
        writer.append_bytes(Some(&request.auth_bytes), true);
        writer.append_tagged_fields();
        writer
    }

    fn parse_body(reader: &mut Reader) -> Result<Self::Response, ProtocolCodecError> {
        let error_code = reader.read_int16()?;
        let error_message = reader.read_nullable_string(true)?;
        let auth_bytes = reader.read_bytes(true)?.to_vec();
        let session_lifetime_ms = reader.read_int64()?;
        reader.read_tagged_fields()?;
        Ok(SaslAuthenticateResponse {
            error_code,
            error_message,
            auth_bytes,
            session_lifetime_ms,
        })
    }

    fn error_locations(response: &Self::Response) -> BTreeMap<String, ErrorLocation> {
        top_level_error_locations(response.error_code, response.error_message.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_session_lifetime_means_no_reauth_timer() {
        let mut writer = Writer::new();
        writer.append_int16(0);
        writer.append_string(None, true);
        writer.append_bytes(Some(b"server-final"), true);
        writer.append_int64(0);
        writer.append_tagged_fields();
        let bytes = writer.into_bytes();
        let mut reader = Reader::new(&bytes);
        let response = SaslAuthenticate::parse_body(&mut reader).unwrap();
        assert_eq!(response.session_lifetime_ms, 0);
        assert_eq!(response.auth_bytes, b"server-final");
    }
}
