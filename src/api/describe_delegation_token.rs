//! DescribeDelegationToken, api_key=41, version=3 (flex).

use super::ApiDescriptor;
use crate::codec::{Reader, Writer};
use crate::error::{ErrorLocation, ProtocolCodecError};
use std::collections::BTreeMap;

pub struct DelegationTokenOwner {
    pub principal_type: String,
    pub principal_name: String,
}

pub struct DescribeDelegationTokenRequest {
    /// `None` requests tokens for every owner the caller is authorized to see.
    pub owners: Option<Vec<DelegationTokenOwner>>,
}

#[derive(Debug, Clone)]
pub struct DelegationToken {
    pub principal_type: String,
    pub principal_name: String,
    pub issue_timestamp: i64,
    pub expiry_timestamp: i64,
    pub max_timestamp: i64,
    pub token_id: String,
    pub hmac: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct DescribeDelegationTokenResponse {
    pub throttle_time_ms: i32,
    pub error_code: i16,
    pub tokens: Vec<DelegationToken>,
}

pub struct DescribeDelegationToken;

impl ApiDescriptor for DescribeDelegationToken {
    type Request = DescribeDelegationTokenRequest;
    type Response = DescribeDelegationTokenResponse;

    const API_KEY: i16 = 41;
    const API_VERSION: i16 = 3;
    const NAME: &'static str = "DescribeDelegationToken";
    const REQUEST_HEADER_FLEX: bool = true;
    const RESPONSE_HEADER_FLEX: bool = true;

    fn encode_body(request: &Self::Request) -> Writer {
        let mut writer = Writer::new();
        match &request.owners {
            None => {
                writer.append_array::<DelegationTokenOwner>(None, true, true, |_, _| {});
            }
            Some(owners) => {
                writer.append_array(Some(&owners[..]), true, true, |w, owner| {
                    w.append_string(Some(&owner.principal_type), true);
                    w.append_string(Some(&owner.principal_name), true);
                    w.append_tagged_fields();
                });
            }
        }
        writer.append_tagged_fields();
        writer
    }

    fn parse_body(reader: &mut Reader) -> Result<Self::Response, ProtocolCodecError> {
        let throttle_time_ms = reader.read_int32()?;
        let error_code = reader.read_int16()?;
        let tokens = reader
            .read_array(true, false, |r| {
                let principal_type = r.read_string(true)?;
                let principal_name = r.read_string(true)?;
                let issue_timestamp = r.read_int64()?;
                let expiry_timestamp = r.read_int64()?;
                let max_timestamp = r.read_int64()?;
                let token_id = r.read_string(true)?;
                let hmac = r.read_bytes(true)?.to_vec();
                r.read_tagged_fields()?;
                Ok(DelegationToken {
                    principal_type,
                    principal_name,
                    issue_timestamp,
                    expiry_timestamp,
                    max_timestamp,
                    token_id,
                    hmac,
                })
            })?
            .unwrap_or_default();
        reader.read_tagged_fields()?;
        Ok(DescribeDelegationTokenResponse {
            throttle_time_ms,
            error_code,
            tokens,
        })
    }

    fn error_locations(response: &Self::Response) -> BTreeMap<String, ErrorLocation> {
        super::top_level_error_locations(response.error_code, None)
    }
}
