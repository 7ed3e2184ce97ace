//! PushTelemetry, api_key=72, version=0 (flex).

use super::{top_level_error_locations, ApiDescriptor};
use crate::codec::{Reader, Writer};
use crate::error::{ErrorLocation, ProtocolCodecError};
use std::collections::BTreeMap;

pub struct PushTelemetryRequest {
    pub client_instance_id: String,
    pub subscription_id: i32,
    pub terminating: bool,
    pub compression_type: i8,
    pub metrics: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct PushTelemetryResponse {
    pub throttle_time_ms: i32,
    pub error_code: i16,
}

pub struct PushTelemetry;

impl ApiDescriptor for PushTelemetry {
    type Request = PushTelemetryRequest;
    type Response = PushTelemetryResponse;

    const API_KEY: i16 = 72;
    const API_VERSION: i16 = 0;
    const NAME: &'static str = "PushTelemetry";
    const REQUEST_HEADER_FLEX: bool = true;
    const RESPONSE_HEADER_FLEX: bool = true;

    fn encode_body(request: &Self::Request) -> Writer {
        let mut writer = Writer::new();
        writer.append_uuid(&request.client_instance_id);
        writer.append_int32(request.subscription_id);
        writer.append_boolean(request.terminating);
        writer.append_int8(request.compression_type);
        writer.append_bytes(Some(&request.metrics), true);
        writer.append_tagged_fields();
        writer
    }

    fn parse_body(reader: &mut Reader) -> Result<Self::Response, ProtocolCodecError> {
        let throttle_time_ms = reader.read_int32()?;
        let error_code = reader.read_int16()?;
        reader.read_tagged_fields()?;
        Ok(PushTelemetryResponse {
            throttle_time_ms,
            error_code,
        })
    }

    fn error_locations(response: &Self::Response) -> BTreeMap<String, ErrorLocation> {
        top_level_error_locations(response.error_code, None)
    }
}
