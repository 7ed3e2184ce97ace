//! UnregisterBroker, api_key=64, version=0 (flex).

use super::{top_level_error_locations, ApiDescriptor};
use crate::codec::{Reader, Writer};
use crate::error::{ErrorLocation, ProtocolCodecError};
use std::collections::BTreeMap;

pub struct UnregisterBrokerRequest {
    pub broker_id: i32,
}

#[derive(Debug, Clone)]
pub struct UnregisterBrokerResponse {
    pub throttle_time_ms: i32,
    pub error_code: i16,
    pub error_message: Option<String>,
}

pub struct UnregisterBroker;

impl ApiDescriptor for UnregisterBroker {
    type Request = UnregisterBrokerRequest;
    type Response = UnregisterBrokerResponse;

    const API_KEY: i16 = 64;
    const API_VERSION: i16 = 0;
    const NAME: &'static str = "UnregisterBroker";
    const REQUEST_HEADER_FLEX: bool = true;
    const RESPONSE_HEADER_FLEX: bool = true;

    fn encode_body(request: &Self::Request) -> Writer {
        let mut writer = Writer::new();
        writer.append_int32(request.broker_id);
        writer.append_tagged_fields();
        writer
    }

    fn parse_body(reader: &mut Reader) -> Result<Self::Response, ProtocolCodecError> {
        let throttle_time_ms = reader.read_int32()?;
        let error_code = reader.read_int16()?;
        let error_message = reader.read_nullable_string(true)?;
        reader.read_tagged_fields()?;
        Ok(UnregisterBrokerResponse {
            throttle_time_ms,
            error_code,
            error_message,
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
    fn unknown_broker_id_surfaces_as_a_top_level_error() {
        let mut writer = Writer::new();
        writer.append_int32(0);
        writer.append_int16(76); // BROKER_ID_NOT_REGISTERED
        writer.append_string(Some("no such broker"), true);
        writer.append_tagged_fields();
        let bytes = writer.into_bytes();
        let mut reader = Reader::new(&bytes);
        let response = UnregisterBroker::parse_body(&mut reader).unwrap();
        assert_eq!(UnregisterBroker::error_locations(&response)["/"].code, 76);
    }
}
