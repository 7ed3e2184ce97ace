//! InitProducerId, api_key=22, version=5 (flex).

use super::{top_level_error_locations, ApiDescriptor};
use crate::codec::{Reader, Writer};
use crate::error::{ErrorLocation, ProtocolCodecError};
use std::collections::BTreeMap;

pub struct InitProducerIdRequest {
    pub transactional_id: Option<String>,
    pub transaction_timeout_ms: i32,
    pub producer_id: i64,
    pub producer_epoch: i16,
}

#[derive(Debug, Clone)]
pub struct InitProducerIdResponse {
    pub throttle_time_ms: i32,
    pub error_code: i16,
    pub producer_id: i64,
    pub producer_epoch: i16,
}

pub struct InitProducerId;

impl ApiDescriptor for InitProducerId {
    type Request = InitProducerIdRequest;
    type Response = InitProducerIdResponse;

    const API_KEY: i16 = 22;
    const API_VERSION: i16 = 5;
    const NAME: &'static str = "InitProducerId";
    const REQUEST_HEADER_FLEX: bool = true;
    const RESPONSE_HEADER_FLEX: bool = true;

    fn encode_body(request: &Self::Request) -> Writer {
        let mut writer = Writer::new();
        writer.append_string(request.transactional_id.as_deref(), true);
        writer.append_int32(request.transaction_timeout_ms);
        writer.append_int64(request.producer_id);
        writer.append_int16(request.producer_epoch);
        writer.append_tagged_fields();
        writer
    }

    fn parse_body(reader: &mut Reader) -> Result<Self::Response, ProtocolCodecError> {
        let throttle_time_ms = reader.read_int32()?;
        let error_code = reader.read_int16()?;
        let producer_id = reader.read_int64()?;
        let producer_epoch = reader.read_int16()?;
        reader.read_tagged_fields()?;
        Ok(InitProducerIdResponse {
            throttle_time_ms,
            error_code,
            producer_id,
            producer_epoch,
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
    fn allocates_a_fresh_producer_id() {
        let mut writer = Writer::new();
        writer.append_int32(0);
        writer.append_int16(0);
        writer.append_int64(1001);
        writer.append_int16(0);
        writer.append_tagged_fields();
        let bytes = writer.into_bytes();
        let mut reader = Reader::new(&bytes);
        let response = InitProducerId::parse_body(&mut reader).unwrap();
        assert_eq!(response.producer_id, 1001);
    }
}
