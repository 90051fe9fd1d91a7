//! Providers: endpoint routing, authentication and response handling
//!
//! A provider binds a [`Model`] to a concrete upstream service. It turns a
//! protocol request into a [`ProviderRequest`] (URL, headers, body), injects
//! auth headers, and decodes buffered or streamed responses through the
//! capability that built the request.

pub mod auth;
pub mod azure;
pub mod error;
pub mod local;
pub mod registry;
pub mod sse;

pub use auth::{Auth, AuthType};
pub use azure::AzureProvider;
pub use error::{ProviderError, ProviderResult};
pub use local::LocalProvider;
pub use registry::{ProviderFactory, ProviderRegistry};
pub use sse::{ProviderChunkStream, SseFraming};

use crate::capabilities::{Capability, StreamingCapability};
use crate::model::Model;
use crate::protocol::{Protocol, ProtocolRequest, ProtocolResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fully addressed request ready to be sent
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Absolute endpoint URL
    pub url: String,
    /// Provider-supplied headers (auth is added separately)
    pub headers: HeaderMap,
    /// JSON body
    pub body: Vec<u8>,
}

/// Path under the base URL serving `protocol`
pub fn endpoint_path(protocol: Protocol) -> &'static str {
    match protocol {
        Protocol::Chat | Protocol::Vision | Protocol::Tools => "/chat/completions",
        Protocol::Embeddings => "/embeddings",
    }
}

/// Trait implemented by every upstream binding
#[async_trait]
pub trait Provider: Send + Sync + fmt::Debug {
    /// Registered provider name
    fn name(&self) -> &str;

    /// The model served through this provider
    fn model(&self) -> &Model;

    /// Normalized base URL
    fn base_url(&self) -> &str;

    /// Absolute URL for `protocol`
    fn endpoint(&self, protocol: Protocol) -> ProviderResult<String>;

    /// Insert auth headers
    fn set_headers(&self, headers: &mut HeaderMap) -> ProviderResult<()>;

    /// SSE framing expected from this upstream
    fn framing(&self) -> SseFraming {
        SseFraming::Lenient
    }

    /// Address and encode a buffered request
    fn prepare_request(
        &self,
        protocol: Protocol,
        request: &ProtocolRequest,
    ) -> ProviderResult<ProviderRequest> {
        if !self.model().supports(protocol) {
            return Err(ProviderError::UnsupportedProtocol {
                provider: self.name().to_string(),
                protocol,
            });
        }

        let url = self.endpoint(protocol)?;
        let body = request.to_json_bytes().map_err(|source| ProviderError::Encode {
            provider: self.name().to_string(),
            source,
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(ProviderRequest { url, headers, body })
    }

    /// Address and encode a streaming request
    fn prepare_stream_request(
        &self,
        protocol: Protocol,
        request: &ProtocolRequest,
    ) -> ProviderResult<ProviderRequest> {
        let mut prepared = self.prepare_request(protocol, request)?;
        prepared
            .headers
            .insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        prepared
            .headers
            .insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        Ok(prepared)
    }

    /// Check the status and decode a buffered response
    async fn process_response(
        &self,
        response: Response,
        capability: &dyn Capability,
    ) -> ProviderResult<ProtocolResponse> {
        let status = response.status();
        let body = response.bytes().await.map_err(|source| ProviderError::Network {
            provider: self.name().to_string(),
            source,
        })?;

        if status != StatusCode::OK {
            return Err(ProviderError::Status {
                provider: self.name().to_string(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        capability
            .parse_response(&body)
            .map_err(|source| ProviderError::Capability {
                provider: self.name().to_string(),
                source,
            })
    }

    /// Check the status and turn the body into a chunk stream
    async fn process_stream_response(
        &self,
        response: Response,
        capability: Arc<dyn StreamingCapability>,
        cancel: CancellationToken,
    ) -> ProviderResult<ProviderChunkStream> {
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: self.name().to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(sse::chunk_stream(
            self.name().to_string(),
            response,
            capability,
            self.framing(),
            cancel,
        ))
    }
}
