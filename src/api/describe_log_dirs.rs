//! DescribeLogDirs, api_key=35, version=4 (flex).

use super::ApiDescriptor;
use crate::codec::{Reader, Writer};
use crate::error::{ErrorLocation, ProtocolCodecError};
use std::collections::BTreeMap;

pub struct DescribeLogDirsTopic {
    pub topic: String,
    pub partitions: Vec<i32>,
}

pub struct DescribeLogDirsRequest {
    /// `None` requests every log dir on the broker.
    pub topics: Option<Vec<DescribeLogDirsTopic>>,
}

#[derive(Debug, Clone)]
pub struct LogDirPartition {
    pub partition_index: i32,
    pub partition_size: i64,
    pub offset_lag: i64,
    pub is_future_key: bool,
}

#[derive(Debug, Clone)]
pub struct LogDirTopic {
    pub topic: String,
    pub partitions: Vec<LogDirPartition>,
}

#[derive(Debug, Clone)]
pub struct LogDirResult {
    pub error_code: i16,
    pub log_dir: String,
    pub topics: Vec<LogDirTopic>,
    pub total_bytes: i64,
    pub usable_bytes: i64,
}

#[derive(Debug, Clone)]
pub struct DescribeLogDirsResponse {
    pub throttle_time_ms: i32,
    pub results: Vec<LogDirResult>,
}

pub struct DescribeLogDirs;

impl ApiDescriptor for DescribeLogDirs {
    type Request = DescribeLogDirsRequest;
    type Response = DescribeLogDirsResponse;

    const API_KEY: i16 = 35;
    const API_VERSION: i16 = 4;
    const NAME: &'static str = "DescribeLogDirs";
    const REQUEST_HEADER_FLEX: bool = true;
    const RESPONSE_HEADER_FLEX: bool = true;

    fn encode_body(request: &Self::Request) -> Writer {
        let mut writer = Writer::new();
        match &request.topics {
            None => {
                writer.append_array::<DescribeLogDirsTopic>(None, true, true, |_, _| {});
            }
            Some(topics) => {
                writer.append_array(Some(&topics[..]), true, true, |w, topic| {
                    w.append_string(Some(&topic.topic), true);
                    w.append_array(Some(&topic.partitions[..]), true, false, |w, p| {
                        w.append_int32(*p);
                    });
                    w.append_tagged_fields();
                });
            }
        }
        writer.append_tagged_fields();
        writer
    }

    fn parse_body(reader: &mut Reader) -> Result<Self::Response, ProtocolCodecError> {
        let throttle_time_ms = reader.read_int32()?;
        let results = reader
            .read_array(true, false, |r| {
                let error_code = r.read_int16()?;
                let log_dir = r.read_string(true)?;
                let topics = r
                    .read_array(true, false, |r| {
                        let topic = r.read_string(true)?;
                        let partitions = r
                            .read_array(true, false, |r| {
                                let partition_index = r.read_int32()?;
                                let partition_size = r.read_int64()?;
                                let offset_lag = r.read_int64()?;
                                let is_future_key = r.read_boolean()?;
                                r.read_tagged_fields()?;
                                Ok(LogDirPartition {
                                    partition_index,
                                    partition_size,
                                    offset_lag,
                                    is_future_key,
                                })
                            })?
                            .unwrap_or_default();
                        r.read_tagged_fields()?;
                        Ok(LogDirTopic { topic, partitions })
                    })?
                    .unwrap_or_default();
                let total_bytes = r.read_int64()?;
                let usable_bytes = r.read_int64()?;
                r.read_tagged_fields()?;
                Ok(LogDirResult {
                    error_code,
                    log_dir,
                    topics,
                    total_bytes,
                    usable_bytes,
                })
            })?
            .unwrap_or_default();
        reader.read_tagged_fields()?;
        Ok(DescribeLogDirsResponse {
            throttle_time_ms,
            results,
        })
    }

    fn error_locations(response: &Self::Response) -> BTreeMap<String, ErrorLocation> {
        super::indexed_error_locations("results", &response.results, |r| r.error_code, |_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_null_topics_array_requests_every_log_dir() {
        let request = DescribeLogDirsRequest { topics: None };
        let bytes = DescribeLogDirs::encode_body(&request).into_bytes();
        // compact-null array prefix is a single zero byte.
        assert_eq!(bytes[0], 0u8);
    }
}
