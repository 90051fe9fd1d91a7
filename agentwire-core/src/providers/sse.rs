//! Server-sent event reader: response body → lazy, cancellable chunk stream

use super::error::{ProviderError, ProviderResult};
use crate::capabilities::streaming::strip_data_prefix;
use crate::capabilities::StreamingCapability;
use crate::protocol::StreamingChunk;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use std::io;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Chunks decoded by a provider, in upstream order
pub type ProviderChunkStream = BoxStream<'static, ProviderResult<StreamingChunk>>;

/// How strictly `data:` framing is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseFraming {
    /// Lines without a `data:` prefix are treated as bare JSON payloads
    Lenient,
    /// Lines without a `data:` prefix are comments and are skipped
    Strict,
}

impl SseFraming {
    /// The payload carried by one line, or `None` when the line is skipped
    pub fn payload<'a>(&self, line: &'a str) -> Option<&'a str> {
        let line = line.trim_end();
        if line.is_empty() {
            return None;
        }

        let payload = match (strip_data_prefix(line), self) {
            (Some(payload), _) => payload,
            (None, SseFraming::Lenient) => line,
            (None, SseFraming::Strict) => return None,
        };
        let payload = payload.trim();
        (!payload.is_empty()).then_some(payload)
    }
}

/// Read `response` line by line and decode chunks with `capability`.
///
/// The stream ends at the terminal sentinel, at end of body, or as soon as
/// `cancel` fires. Undecodable frames (bad UTF-8 or bad JSON) are skipped; a
/// read failure is yielded once as an error and ends the stream. Dropping the
/// stream releases the body.
pub fn chunk_stream(
    provider: String,
    response: reqwest::Response,
    capability: Arc<dyn StreamingCapability>,
    framing: SseFraming,
    cancel: CancellationToken,
) -> ProviderChunkStream {
    let body = response.bytes_stream().map_err(io::Error::other);
    let mut lines = StreamReader::new(body).split(b'\n');

    Box::pin(async_stream::stream! {
        loop {
            let line = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Stream from {} cancelled", provider);
                    break;
                }
                line = lines.next_segment() => line,
            };

            match line {
                Ok(Some(raw)) => {
                    let line = match std::str::from_utf8(&raw) {
                        Ok(line) => line,
                        Err(e) => {
                            trace!("Skipping non UTF-8 frame from {}: {}", provider, e);
                            continue;
                        }
                    };
                    let Some(payload) = framing.payload(line) else {
                        continue;
                    };
                    if capability.is_stream_complete(payload) {
                        debug!("Stream from {} completed", provider);
                        break;
                    }
                    match capability.parse_chunk(payload) {
                        Ok(chunk) => {
                            if cancel.is_cancelled() {
                                break;
                            }
                            yield Ok(chunk);
                        }
                        Err(e) => trace!("Skipping undecodable frame from {}: {}", provider, e),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    yield Err(ProviderError::Stream {
                        provider: provider.clone(),
                        message: e.to_string(),
                    });
                    break;
                }
            }
        }
    })
}
