//! DeleteRecords, api_key=21, version=2. Predates the flex-version rollout;
//! no tag buffers anywhere in this call.

use super::ApiDescriptor;
use crate::codec::{Reader, Writer};
use crate::error::{ErrorLocation, ProtocolCodecError};
use std::collections::BTreeMap;

pub struct DeleteRecordsPartition {
    pub partition_index: i32,
    pub offset: i64,
}

pub struct DeleteRecordsTopic {
    pub name: String,
    pub partitions: Vec<DeleteRecordsPartition>,
}

pub struct DeleteRecordsRequest {
    pub topics: Vec<DeleteRecordsTopic>,
    pub timeout_ms: i32,
}

#[derive(Debug, Clone)]
pub struct DeletedPartition {
    pub partition_index: i32,
    pub low_watermark: i64,
    pub error_code: i16,
}

#[derive(Debug, Clone)]
pub struct DeleteRecordsResponseTopic {
    pub name: String,
    pub partitions: Vec<DeletedPartition>,
}

#[derive(Debug, Clone)]
pub struct DeleteRecordsResponse {
    pub throttle_time_ms: i32,
    pub topics: Vec<DeleteRecordsResponseTopic>,
}

pub struct DeleteRecords;

impl ApiDescriptor for DeleteRecords {
    type Request = DeleteRecordsRequest;
    type Response = DeleteRecordsResponse;

    const API_KEY: i16 = 21;
    const API_VERSION: i16 = 2;
    const NAME: &'static str = "DeleteRecords";
    const REQUEST_HEADER_FLEX: bool = false;
    const RESPONSE_HEADER_FLEX: bool = false;

    fn encode_body(request: &Self::Request) -> Writer {
        let mut writer = Writer::new();
        writer.append_array(Some(&request.topics[..]), false, false, |w, topic| {
            w.append_string(Some(&topic.name), false);
            w.append_array(Some(&topic.partitions[..]), false, false, |w, p| {
                w.append_int32(p.partition_index);
                w.append_int64(p.offset);
            });
        });
        writer.append_int32(request.timeout_ms);
        writer
    }

    fn parse_body(reader: &mut Reader) -> Result<Self::Response, ProtocolCodecError> {
        let throttle_time_ms = reader.read_int32()?;
        let topics = reader
            .read_array(false, false, |r| {
                let name = r.read_string(false)?;
                let partitions = r
                    .read_array(false, false, |r| {
                        let partition_index = r.read_int32()?;
                        let low_watermark = r.read_int64()?;
                        let error_code = r.read_int16()?;
                        Ok(DeletedPartition {
                            partition_index,
                            low_watermark,
                            error_code,
                        })
                    })?
                    .unwrap_or_default();
                Ok(DeleteRecordsResponseTopic { name, partitions })
            })?
            .unwrap_or_default();
        Ok(DeleteRecordsResponse {
            throttle_time_ms,
            topics,
        })
    }

    fn error_locations(response: &Self::Response) -> BTreeMap<String, ErrorLocation> {
        let mut map = BTreeMap::new();
        for (topic_index, topic) in response.topics.iter().enumerate() {
            for (partition_index, partition) in topic.partitions.iter().enumerate() {
                if partition.error_code != 0 {
                    map.insert(
                        format!("/topics/{topic_index}/partitions/{partition_index}"),
                        ErrorLocation {
                            code: partition.error_code,
                            message: None,
                        },
                    );
                }
            }
        }
        map
    }
}
