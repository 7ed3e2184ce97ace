//! ConsumerGroupDescribe, api_key=69, version=0 (flex).

use super::ApiDescriptor;
use crate::codec::{Reader, Writer};
use crate::error::{ErrorLocation, ProtocolCodecError};
use std::collections::BTreeMap;

pub struct ConsumerGroupDescribeRequest {
    pub group_ids: Vec<String>,
    pub include_authorized_operations: bool,
}

#[derive(Debug, Clone)]
pub struct ConsumerGroupMember {
    pub member_id: String,
    pub member_epoch: i32,
    pub client_id: String,
    pub client_host: String,
    pub subscribed_topic_names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ConsumerGroupDescription {
    pub error_code: i16,
    pub error_message: Option<String>,
    pub group_id: String,
    pub group_state: String,
    pub group_epoch: i32,
    pub assignment_epoch: i32,
    pub assignor_name: String,
    pub members: Vec<ConsumerGroupMember>,
    pub authorized_operations: i32,
}

#[derive(Debug, Clone)]
pub struct ConsumerGroupDescribeResponse {
    pub throttle_time_ms: i32,
    pub groups: Vec<ConsumerGroupDescription>,
}

pub struct ConsumerGroupDescribe;

impl ApiDescriptor for ConsumerGroupDescribe {
    type Request = ConsumerGroupDescribeRequest;
    type Response = ConsumerGroupDescribeResponse;

    const API_KEY: i16 = 69;
    const API_VERSION: i16 = 0;
    const NAME: &'static str = "ConsumerGroupDescribe";
    const REQUEST_HEADER_FLEX: bool = true;
    const RESPONSE_HEADER_FLEX: bool = true;

    fn encode_body(request: &Self::Request) -> Writer {
        let mut writer = Writer::new();
        writer.append_array(Some(&request.group_ids[..]), true, false, |w, id| {
            w.append_string(Some(id), true);
        });
        writer.append_boolean(request.include_authorized_operations);
        writer.append_tagged_fields();
        writer
    }

    fn parse_body(reader: &mut Reader) -> Result<Self::Response, ProtocolCodecError> {
        let throttle_time_ms = reader.read_int32()?;
        let groups = reader
            .read_array(true, false, |r| {
                let error_code = r.read_int16()?;
                let error_message = r.read_nullable_string(true)?;
                let group_id = r.read_string(true)?;
                let group_state = r.read_string(true)?;
                let group_epoch = r.read_int32()?;
                let assignment_epoch = r.read_int32()?;
                let assignor_name = r.read_string(true)?;
                let members = r
                    .read_array(true, false, |r| {
                        let member_id = r.read_string(true)?;
                        let member_epoch = r.read_int32()?;
                        let client_id = r.read_string(true)?;
                        let client_host = r.read_string(true)?;
                        let subscribed_topic_names = r
                            .read_array(true, false, |r| r.read_string(true))?
                            .unwrap_or_default();
                        r.read_tagged_fields()?;
                        Ok(ConsumerGroupMember {
                            member_id,
                            member_epoch,
                            client_id,
                            client_host,
                            subscribed_topic_names,
                        })
                    })?
                    .unwrap_or_default();
                let authorized_operations = r.read_int32()?;
                r.read_tagged_fields()?;
                Ok(ConsumerGroupDescription {
                    error_code,
                    error_message,
                    group_id,
                    group_state,
                    group_epoch,
                    assignment_epoch,
                    assignor_name,
                    members,
                    authorized_operations,
                })
            })?
            .unwrap_or_default();
        reader.read_tagged_fields()?;
        Ok(ConsumerGroupDescribeResponse {
            throttle_time_ms,
            groups,
        })
    }

    fn error_locations(response: &Self::Response) -> BTreeMap<String, ErrorLocation> {
        super::indexed_error_locations(
            "groups",
            &response.groups,
            |g| g.error_code,
            |g| g.error_message.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_group_not_found_does_not_drop_the_others() {
        let mut writer = Writer::new();
        writer.append_int32(0);
        writer.append_array(Some(&["group-a", "group-b"][..]), true, false, |w, id| {
            let (code, message) = if *id == "group-b" {
                (69i16, Some("group id not found"))
            } else {
                (0i16, None)
            };
            w.append_int16(code);
            w.append_string(message, true);
            w.append_string(Some(id), true);
            w.append_string(Some("Stable"), true);
            w.append_int32(1);
            w.append_int32(1);
            w.append_string(Some("range"), true);
            w.append_array::<()>(Some(&[]), true, false, |_, _| {});
            w.append_int32(0);
            w.append_tagged_fields();
        });
        writer.append_tagged_fields();
        let bytes = writer.into_bytes();
        let mut reader = Reader::new(&bytes);
        let response = ConsumerGroupDescribe::parse_body(&mut reader).unwrap();
        assert_eq!(response.groups.len(), 2);
        let locations = ConsumerGroupDescribe::error_locations(&response);
        assert_eq!(locations.len(), 1);
        assert_eq!(locations["/groups/1"].code, 69);
    }
}
