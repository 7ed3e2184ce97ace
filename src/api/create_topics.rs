//! CreateTopics, api_key=19, version=7 (flex). spec.md §6, §8 scenario 3
//! (per-element error aggregation) is grounded on this exact call.

use super::{indexed_error_locations, ApiDescriptor};
use crate::codec::{Reader, Writer};
use crate::error::{ErrorLocation, ProtocolCodecError};
use std::collections::BTreeMap;

pub struct CreateTopicsRequestTopic {
    pub name: String,
    pub num_partitions: i32,
    pub replication_factor: i16,
    pub assignments: Vec<PartitionAssignment>,
    pub configs: Vec<TopicConfig>,
}

pub struct PartitionAssignment {
    pub partition_index: i32,
    pub broker_ids: Vec<i32>,
}

pub struct TopicConfig {
    pub name: String,
    pub value: Option<String>,
}

pub struct CreateTopicsRequest {
    pub topics: Vec<CreateTopicsRequestTopic>,
    pub timeout_ms: i32,
    pub validate_only: bool,
}

#[derive(Debug, Clone)]
pub struct CreateTopicsResponseTopic {
    pub name: String,
    pub topic_id: String,
    pub error_code: i16,
    pub error_message: Option<String>,
    pub num_partitions: i32,
    pub replication_factor: i16,
}

#[derive(Debug, Clone)]
pub struct CreateTopicsResponse {
    pub throttle_time_ms: i32,
    pub topics: Vec<CreateTopicsResponseTopic>,
}

pub struct CreateTopics;

impl ApiDescriptor for CreateTopics {
    type Request = CreateTopicsRequest;
    type Response = CreateTopicsResponse;

    const API_KEY: i16 = 19;
    const API_VERSION: i16 = 7;
    const NAME: &'static str = "CreateTopics";
    const REQUEST_HEADER_FLEX: bool = true;
    const RESPONSE_HEADER_FLEX: bool = true;

    fn encode_body(request: &Self::Request) -> Writer {
        let mut writer = Writer::new();
        writer.append_array(Some(&request.topics[..]), true, true, |w, topic| {
            w.append_string(Some(&topic.name), true);
            w.append_int32(topic.num_partitions);
            w.append_int16(topic.replication_factor);
            w.append_array(Some(&topic.assignments[..]), true, true, |w, assignment| {
                w.append_int32(assignment.partition_index);
                w.append_array(Some(&assignment.broker_ids[..]), true, true, |w, id| {
                    w.append_int32(*id);
                });
                w.append_tagged_fields();
            });
            w.append_array(Some(&topic.configs[..]), true, true, |w, config| {
                w.append_string(Some(&config.name), true);
                w.append_string(config.value.as_deref(), true);
                w.append_tagged_fields();
            });
            w.append_tagged_fields();
        });
        writer.append_int32(request.timeout_ms);
        writer.append_boolean(request.validate_only);
        writer.append_tagged_fields();
        writer
    }

    fn parse_body(reader: &mut Reader) -> Result<Self::Response, ProtocolCodecError> {
        let throttle_time_ms = reader.read_int32()?;
        let topics = reader
            .read_array(true, true, |r| {
                let name = r.read_string(true)?;
                let topic_id = r.read_uuid()?;
                let error_code = r.read_int16()?;
                let error_message = r.read_nullable_string(true)?;
                let num_partitions = r.read_int32()?;
                let replication_factor = r.read_int16()?;
                // configs array, ignored beyond skipping its bytes via normal reads
                r.read_array(true, true, |r| {
                    let _name = r.read_string(true)?;
                    let _value = r.read_nullable_string(true)?;
                    let _read_only = r.read_boolean()?;
                    let _config_source = r.read_int8()?;
                    let _is_sensitive = r.read_boolean()?;
                    r.read_tagged_fields()?;
                    Ok::<_, ProtocolCodecError>(())
                })?;
                r.read_tagged_fields()?;
                Ok(CreateTopicsResponseTopic {
                    name,
                    topic_id,
                    error_code,
                    error_message,
                    num_partitions,
                    replication_factor,
                })
            })?
            .unwrap_or_default();
        reader.read_tagged_fields()?;
        Ok(CreateTopicsResponse {
            throttle_time_ms,
            topics,
        })
    }

    fn error_locations(response: &Self::Response) -> BTreeMap<String, ErrorLocation> {
        indexed_error_locations(
            "topics",
            &response.topics,
            |t| t.error_code,
            |t| t.error_message.clone(),
        )
    }
}
