//! ApiVersions, api_key=18, version=3. The request body is flex, but the
//! response *header* stays the non-flex v0 shape: a client cannot know
//! whether the broker understands flex headers until this call's response
//! tells it which versions are supported, so the header format can't depend
//! on the answer. `Connection` special-cases this one descriptor for that
//! reason (spec.md §6).

use super::{top_level_error_locations, ApiDescriptor};
use crate::codec::{Reader, Writer};
use crate::error::{ErrorLocation, ProtocolCodecError};
use std::collections::BTreeMap;

pub struct ApiVersionsRequest {
    pub client_software_name: String,
    pub client_software_version: String,
}

#[derive(Debug, Clone)]
pub struct SupportedApiVersion {
    pub api_key: i16,
    pub min_version: i16,
    pub max_version: i16,
}

#[derive(Debug, Clone)]
pub struct ApiVersionsResponse {
    pub error_code: i16,
    pub api_keys: Vec<SupportedApiVersion>,
    pub throttle_time_ms: i32,
}

pub struct ApiVersions;

impl ApiDescriptor for ApiVersions {
    type Request = ApiVersionsRequest;
    type Response = ApiVersionsResponse;

    const API_KEY: i16 = 18;
    const API_VERSION: i16 = 3;
    const NAME: &'static str = "ApiVersions";
    const REQUEST_HEADER_FLEX: bool = true;
    const RESPONSE_HEADER_FLEX: bool = false;

    fn encode_body(request: &Self::Request) -> Writer {
        let mut writer = Writer::new();
        writer.append_string(Some(&request.client_software_name), true);
        writer.append_string(Some(&request.client_software_version), true);
        writer.append_tagged_fields();
        writer
    }

    fn parse_body(reader: &mut Reader) -> Result<Self::Response, ProtocolCodecError> {
        let error_code = reader.read_int16()?;
        let api_keys = reader
            .read_array(true, false, |r| {
                let api_key = r.read_int16()?;
                let min_version = r.read_int16()?;
                let max_version = r.read_int16()?;
                r.read_tagged_fields()?;
                Ok(SupportedApiVersion {
                    api_key,
                    min_version,
                    max_version,
                })
            })?
            .unwrap_or_default();
        let throttle_time_ms = reader.read_int32()?;
        reader.read_tagged_fields()?;
        Ok(ApiVersionsResponse {
            error_code,
            api_keys,
            throttle_time_ms,
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
    fn parses_the_supported_version_table() {
        let mut writer = Writer::new();
        writer.append_int16(0);
        writer.append_array(Some(&[(19i16, 0i16, 7i16)][..]), true, false, |w, (k, lo, hi)| {
            w.append_int16(*k);
            w.append_int16(*lo);
            w.append_int16(*hi);
            w.append_tagged_fields();
        });
        writer.append_int32(0);
        writer.append_tagged_fields();
        let bytes = writer.into_bytes();
        let mut reader = Reader::new(&bytes);
        let response = ApiVersions::parse_body(&mut reader).unwrap();
        assert_eq!(response.api_keys[0].api_key, 19);
        assert_eq!(response.api_keys[0].max_version, 7);
    }
}
