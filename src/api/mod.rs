//! Component D: the API descriptor catalog. Each descriptor binds a
//! `(api_key, api_version)` pair to an encoder, a parser, and the two
//! header-flex flags spec.md §4.3 requires; [`Connection::send`] is the one
//! place that actually drives them (spec.md §9 "Per-API descriptors" design
//! note — a data-driven table rather than one bespoke function per call).

pub mod api_versions;
pub mod consumer_group_describe;
pub mod create_topics;
pub mod delete_records;
pub mod describe_cluster;
pub mod describe_delegation_token;
pub mod describe_log_dirs;
pub mod get_telemetry_subscriptions;
pub mod init_producer_id;
pub mod list_client_metrics_resources;
pub mod push_telemetry;
pub mod sasl_authenticate;
pub mod sasl_handshake;
pub mod unregister_broker;

use crate::codec::{Reader, Writer};
use crate::error::{ErrorLocation, ProtocolCodecError};
use std::collections::BTreeMap;

/// Binds a fixed `(api_key, api_version)` pair to its request/response types
/// and wire encoding. Implemented once per supported call (spec.md §6's API
/// catalog table).
pub trait ApiDescriptor {
    type Request;
    type Response;

    const API_KEY: i16;
    const API_VERSION: i16;
    const NAME: &'static str;

    /// Whether this call's request/response headers carry a trailing empty
    /// tag buffer (flex versions, spec.md §6).
    const REQUEST_HEADER_FLEX: bool;
    const RESPONSE_HEADER_FLEX: bool;

    /// This call expects no response frame (e.g. fire-and-forget produce).
    /// None of the APIs in this catalog set it; it exists so `Connection`
    /// has a uniform flag to read regardless of which descriptor it holds.
    const NO_RESPONSE: bool = false;

    fn encode_body(request: &Self::Request) -> Writer;

    fn parse_body(reader: &mut Reader) -> Result<Self::Response, ProtocolCodecError>;

    /// Collects non-zero `error_code` fields into a JSON-pointer-path map,
    /// for the `ResponseError` aggregation spec.md §4.3/§8 scenario 3
    /// requires. Most list-shaped responses override this; scalar
    /// responses with a single top-level `error_code` can use the default
    /// by calling [`top_level_error`] directly instead.
    fn error_locations(_response: &Self::Response) -> BTreeMap<String, ErrorLocation> {
        BTreeMap::new()
    }
}

/// Helper for descriptors whose response has one top-level `error_code`.
pub fn top_level_error_locations(error_code: i16, message: Option<&str>) -> BTreeMap<String, ErrorLocation> {
    let mut map = BTreeMap::new();
    if error_code != 0 {
        map.insert(
            "/".to_string(),
            ErrorLocation {
                code: error_code,
                message: message.map(str::to_string),
            },
        );
    }
    map
}

/// Helper for descriptors whose response is `{ items: Vec<{ error_code, .. }> }`
/// at a single nesting level, addressed as `/<field>/<index>`.
pub fn indexed_error_locations<T>(
    field: &str,
    items: &[T],
    error_code: impl Fn(&T) -> i16,
    message: impl Fn(&T) -> Option<String>,
) -> BTreeMap<String, ErrorLocation> {
    let mut map = BTreeMap::new();
    for (index, item) in items.iter().enumerate() {
        let code = error_code(item);
        if code != 0 {
            map.insert(
                format!("/{field}/{index}"),
                ErrorLocation {
                    code,
                    message: message(item),
                },
            );
        }
    }
    map
}
