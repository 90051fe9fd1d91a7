//! Streaming chunk helpers shared by chat-shaped capabilities

use super::error::{CapabilityError, CapabilityResult};
use crate::protocol::StreamingChunk;

/// Payload that terminates an SSE stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// SSE data field prefix
pub const SSE_DATA_PREFIX: &str = "data:";

/// Strip the SSE `data:` prefix and the single optional space after it.
///
/// Returns `None` when the line is not a data line.
pub fn strip_data_prefix(line: &str) -> Option<&str> {
    line.strip_prefix(SSE_DATA_PREFIX)
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
}

/// Whether a payload (prefix already stripped) ends the stream.
///
/// Exact `[DONE]` is the normal case. A payload that merely contains the
/// sentinel only counts when it is not a JSON object, so a content delta that
/// happens to include the text `[DONE]` does not cut the stream short.
pub fn is_done(payload: &str) -> bool {
    let payload = payload.trim();
    payload == DONE_SENTINEL
        || (payload.contains(DONE_SENTINEL) && !payload.starts_with('{'))
}

/// Decode one payload into a chunk, tolerating a leftover `data:` prefix
pub fn decode_chunk(capability: &str, payload: &str) -> CapabilityResult<StreamingChunk> {
    let payload = payload.trim();
    let payload = strip_data_prefix(payload).unwrap_or(payload);
    serde_json::from_str(payload).map_err(|source| CapabilityError::Decode {
        capability: capability.to_string(),
        source,
    })
}
