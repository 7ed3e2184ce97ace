//! DescribeCluster, api_key=60, version=1 (flex).

use super::{top_level_error_locations, ApiDescriptor};
use crate::codec::{Reader, Writer};
use crate::error::{ErrorLocation, ProtocolCodecError};
use std::collections::BTreeMap;

pub struct DescribeClusterRequest {
    pub include_cluster_authorized_operations: bool,
    pub endpoint_type: i8,
}

#[derive(Debug, Clone)]
pub struct DescribeClusterBroker {
    pub broker_id: i32,
    pub host: String,
    pub port: i32,
    pub rack: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DescribeClusterResponse {
    pub throttle_time_ms: i32,
    pub error_code: i16,
    pub error_message: Option<String>,
    pub cluster_id: String,
    pub controller_id: i32,
    pub brokers: Vec<DescribeClusterBroker>,
    pub cluster_authorized_operations: i32,
}

pub struct DescribeCluster;

impl ApiDescriptor for DescribeCluster {
    type Request = DescribeClusterRequest;
    type Response = DescribeClusterResponse;

    const API_KEY: i16 = 60;
    const API_VERSION: i16 = 1;
    const NAME: &'static str = "DescribeCluster";
    const REQUEST_HEADER_FLEX: bool = true;
    const RESPONSE_HEADER_FLEX: bool = true;

    fn encode_body(request: &Self::Request) -> Writer {
        let mut writer = Writer::new();
        writer.append_boolean(request.include_cluster_authorized_operations);
        writer.append_int8(request.endpoint_type);
        writer.append_tagged_fields();
        writer
    }

    fn parse_body(reader: &mut Reader) -> Result<Self::Response, ProtocolCodecError> {
        let throttle_time_ms = reader.read_int32()?;
        let error_code = reader.read_int16()?;
        let error_message = reader.read_nullable_string(true)?;
        let cluster_id = reader.read_string(true)?;
        let controller_id = reader.read_int32()?;
        let brokers = reader
            .read_array(true, false, |r| {
                let broker_id = r.read_int32()?;
                let host = r.read_string(true)?;
                let port = r.read_int32()?;
                let rack = r.read_nullable_string(true)?;
                r.read_tagged_fields()?;
                Ok(DescribeClusterBroker {
                    broker_id,
                    host,
                    port,
                    rack,
                })
            })?
            .unwrap_or_default();
        let cluster_authorized_operations = reader.read_int32()?;
        reader.read_tagged_fields()?;
        Ok(DescribeClusterResponse {
            throttle_time_ms,
            error_code,
            error_message,
            cluster_id,
            controller_id,
            brokers,
            cluster_authorized_operations,
        })
    }

    fn error_locations(response: &Self::Response) -> BTreeMap<String, ErrorLocation> {
        top_level_error_locations(response.error_code, response.error_message.as_deref())
    }
}
