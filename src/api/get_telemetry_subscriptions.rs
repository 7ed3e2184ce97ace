//! GetTelemetrySubscriptions, api_key=71, version=0 (flex).

use super::{top_level_error_locations, ApiDescriptor};
use crate::codec::{Reader, Writer};
use crate::error::{ErrorLocation, ProtocolCodecError};
use std::collections::BTreeMap;

pub struct GetTelemetrySubscriptionsRequest {
    pub client_instance_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GetTelemetrySubscriptionsResponse {
    pub throttle_time_ms: i32,
    pub error_code: i16,
    pub client_instance_id: String,
    pub subscription_id: i32,
    pub accepted_compression_types: Vec<i8>,
    pub push_interval_ms: i32,
    pub telemetry_max_bytes: i32,
    pub delta_temporality: bool,
    pub requested_metrics: Vec<String>,
}

pub struct GetTelemetrySubscriptions;

impl ApiDescriptor for GetTelemetrySubscriptions {
    type Request = GetTelemetrySubscriptionsRequest;
    type Response = GetTelemetrySubscriptionsResponse;

    const API_KEY: i16 = 71;
    const API_VERSION: i16 = 0;
    const NAME: &'static str = "GetTelemetrySubscriptions";
    const REQUEST_HEADER_FLEX: bool = true;
    const RESPONSE_HEADER_FLEX: bool = true;

    fn encode_body(request: &Self::Request) -> Writer {
        let mut writer = Writer::new();
        let zero_uuid = [0u8; 16];
        match &request.client_instance_id {
            Some(id) => {
                writer.append_uuid(id);
            }
            None => {
                writer.append_uuid_bytes(zero_uuid);
            }
        }
        writer.append_tagged_fields();
        writer
    }

    fn parse_body(reader: &mut Reader) -> Result<Self::Response, ProtocolCodecError> {
        let throttle_time_ms = reader.read_int32()?;
        let error_code = reader.read_int16()?;
        let client_instance_id = reader.read_uuid()?;
        let subscription_id = reader.read_int32()?;
        let accepted_compression_types = reader
            .read_array(true, false, |r| r.read_int8())?
            .unwrap_or_default();
        let push_interval_ms = reader.read_int32()?;
        let telemetry_max_bytes = reader.read_int32()?;
        let delta_temporality = reader.read_boolean()?;
        let requested_metrics = reader
            .read_array(true, false, |r| r.read_string(true))?
            .unwrap_or_default();
        reader.read_tagged_fields()?;
        Ok(GetTelemetrySubscriptionsResponse {
            throttle_time_ms,
            error_code,
            client_instance_id,
            subscription_id,
            accepted_compression_types,
            push_interval_ms,
            telemetry_max_bytes,
            delta_temporality,
            requested_metrics,
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
    fn an_absent_client_instance_id_encodes_as_the_nil_uuid() {
        let request = GetTelemetrySubscriptionsRequest {
            client_instance_id: None,
        };
        let bytes = GetTelemetrySubscriptions::encode_body(&request).into_bytes();
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_uuid().unwrap(), "00000000-0000-0000-0000-000000000000");
    }
}
