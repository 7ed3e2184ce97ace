//! ListClientMetricsResources, api_key=74, version=0 (flex). Empty request
//! body beyond the tag buffer.

use super::ApiDescriptor;
use crate::codec::{Reader, Writer};
use crate::error::{ErrorLocation, ProtocolCodecError};
use std::collections::BTreeMap;

pub struct ListClientMetricsResourcesRequest;

#[derive(Debug, Clone)]
pub struct ListClientMetricsResourcesResponse {
    pub throttle_time_ms: i32,
    pub error_code: i16,
    pub client_metrics_resources: Vec<String>,
}

pub struct ListClientMetricsResources;

impl ApiDescriptor for ListClientMetricsResources {
    type Request = ListClientMetricsResourcesRequest;
    type Response = ListClientMetricsResourcesResponse;

    const API_KEY: i16 = 74;
    const API_VERSION: i16 = 0;
    const NAME: &'static str = "ListClientMetricsResources";
    const REQUEST_HEADER_FLEX: bool = true;
    const RESPONSE_HEADER_FLEX: bool = true;

    fn encode_body(_request: &Self::Request) -> Writer {
        let mut writer = Writer::new();
        writer.append_tagged_fields();
        writer
    }

    fn parse_body(reader: &mut Reader) -> Result<Self::Response, ProtocolCodecError> {
        let throttle_time_ms = reader.read_int32()?;
        let error_code = reader.read_int16()?;
        let client_metrics_resources = reader
            .read_array(true, false, |r| {
                let name = r.read_string(true)?;
                r.read_tagged_fields()?;
                Ok(name)
            })?
            .unwrap_or_default();
        reader.read_tagged_fields()?;
        Ok(ListClientMetricsResourcesResponse {
            throttle_time_ms,
            error_code,
            client_metrics_resources,
        })
    }

    fn error_locations(response: &Self::Response) -> BTreeMap<String, ErrorLocation> {
        super::top_level_error_locations(response.error_code, None)
    }
}
