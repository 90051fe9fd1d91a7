//! Transport client: one request against one provider and model

use super::error::{ClientError, ClientResult};
use super::health::{Health, HealthTracker};
use super::retry::{RetryExecutor, RetryPolicy};
use super::ClientRequest;
use crate::capabilities::Capability;
use crate::config::TransportConfig;
use crate::model::Model;
use crate::protocol::{ProtocolResponse, StreamingChunk};
use crate::providers::{Provider, ProviderRegistry, ProviderRequest};
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Response};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Default user agent
const USER_AGENT: &str = concat!("agentwire/", env!("CARGO_PKG_VERSION"));

/// Correlation header carried by every request
const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Chunks forwarded to the caller, in upstream order
pub type ChunkStream = BoxStream<'static, ClientResult<StreamingChunk>>;

/// Executes requests against one provider with pooled connections, retries
/// and health tracking. Safe to share between tasks.
pub struct TransportClient {
    provider: Arc<dyn Provider>,
    http: Client,
    retry: RetryPolicy,
    health: Arc<HealthTracker>,
}

impl TransportClient {
    /// Create a client around an existing provider
    pub fn new(provider: Arc<dyn Provider>, config: &TransportConfig) -> ClientResult<Self> {
        let http = ClientBuilder::new()
            .pool_max_idle_per_host(config.connection_pool_size)
            .pool_idle_timeout(config.connection_timeout)
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            provider,
            http,
            retry: RetryPolicy::from_config(config),
            health: Arc::new(HealthTracker::new()),
        })
    }

    /// Create a client whose provider comes from the global provider registry
    pub fn from_config(config: &TransportConfig) -> ClientResult<Self> {
        let provider = ProviderRegistry::global().create(&config.provider)?;
        Self::new(provider, config)
    }

    /// Replace the retry policy derived from configuration
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// The provider requests are sent to
    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    /// The model served by the provider
    pub fn model(&self) -> &Model {
        self.provider.model()
    }

    /// The active retry policy
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Copy of the current health state
    pub fn health(&self) -> Health {
        self.health.snapshot()
    }

    /// Whether the last completed exchange succeeded
    pub fn is_healthy(&self) -> bool {
        self.health.snapshot().healthy
    }

    /// Execute a buffered request, retrying transient failures
    pub async fn execute(
        &self,
        cancel: &CancellationToken,
        request: &ClientRequest,
    ) -> ClientResult<ProtocolResponse> {
        let request_id = Uuid::new_v4();
        let protocol = request.protocol;
        let model = self.provider.model();
        let capability = model.capability(protocol)?.capability();

        let options = model.merge_request_options(protocol, &request.options);
        let body = capability.create_request(&request.messages, &options, model.name())?;
        let prepared = self.provider.prepare_request(protocol, &body)?;
        let headers = self.headers(&prepared, request_id)?;

        info!(
            "Executing {} request to {} [request_id: {}]",
            protocol,
            self.provider.name(),
            request_id
        );

        let result = RetryExecutor::new(&self.retry)
            .execute(cancel, |attempt| {
                let headers = headers.clone();
                let prepared = &prepared;
                async move {
                    self.attempt(prepared, headers, capability, request_id, attempt)
                        .await
                }
            })
            .await;

        match &result {
            Ok(_) => info!(
                "Request completed successfully for {} [request_id: {}]",
                self.provider.name(),
                request_id
            ),
            Err(e) if e.is_cancelled() => {
                debug!("Request cancelled [request_id: {}]", request_id)
            }
            Err(e) => error!(
                "Request to {} failed: {} [request_id: {}]",
                self.provider.name(),
                e,
                request_id
            ),
        }
        result
    }

    /// Open a streaming request. Streams are never retried.
    ///
    /// The returned stream ends at the upstream terminator, at end of body, or
    /// when `cancel` fires; dropping it releases the connection.
    pub async fn execute_stream(
        &self,
        cancel: &CancellationToken,
        request: &ClientRequest,
    ) -> ClientResult<ChunkStream> {
        let request_id = Uuid::new_v4();
        let protocol = request.protocol;
        let model = self.provider.model();
        let handle = model.capability(protocol)?;

        let capability = match handle.as_streaming() {
            Some(capability) if protocol.supports_streaming() => capability,
            _ => {
                return Err(ClientError::StreamingUnsupported {
                    protocol,
                    format: handle.name().to_string(),
                })
            }
        };

        let options = model.merge_request_options(protocol, &request.options);
        let body =
            capability.create_streaming_request(&request.messages, &options, model.name())?;
        let prepared = self.provider.prepare_stream_request(protocol, &body)?;
        let headers = self.headers(&prepared, request_id)?;

        info!(
            "Opening {} stream to {} [request_id: {}]",
            protocol,
            self.provider.name(),
            request_id
        );

        let response = self
            .send(cancel, &prepared, headers, request_id)
            .await?;

        let upstream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            result = self.provider.process_stream_response(response, capability, cancel.clone()) => result,
        };
        let mut upstream = match upstream {
            Ok(upstream) => upstream,
            Err(e) => {
                warn!(
                    "Stream rejected by {}: {} [request_id: {}]",
                    self.provider.name(),
                    e,
                    request_id
                );
                self.health.mark(self.provider.name(), false);
                return Err(e.into());
            }
        };

        let health = Arc::clone(&self.health);
        let provider = self.provider.name().to_string();
        let cancel = cancel.clone();

        Ok(Box::pin(async_stream::stream! {
            let mut failed = false;
            while let Some(item) = upstream.next().await {
                match item {
                    Ok(chunk) => yield Ok(chunk),
                    Err(e) => {
                        error!("Stream from {} failed: {} [request_id: {}]", provider, e, request_id);
                        failed = true;
                        yield Err(ClientError::from(e));
                    }
                }
            }

            if failed {
                health.mark(&provider, false);
            } else if cancel.is_cancelled() {
                debug!("Stream cancelled [request_id: {}]", request_id);
            } else {
                health.mark(&provider, true);
                debug!("Stream closed [request_id: {}]", request_id);
            }
        }))
    }

    /// Provider headers, then auth headers, then the correlation id
    fn headers(&self, prepared: &ProviderRequest, request_id: Uuid) -> ClientResult<HeaderMap> {
        let mut headers = prepared.headers.clone();
        self.provider.set_headers(&mut headers)?;
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            headers.insert(REQUEST_ID_HEADER, value);
        }
        Ok(headers)
    }

    /// One buffered attempt: send, check status, decode
    async fn attempt(
        &self,
        prepared: &ProviderRequest,
        headers: HeaderMap,
        capability: &dyn Capability,
        request_id: Uuid,
        attempt: u32,
    ) -> ClientResult<ProtocolResponse> {
        debug!(
            "Attempt {} POST {} [request_id: {}]",
            attempt, prepared.url, request_id
        );
        let response = self
            .http
            .post(&prepared.url)
            .headers(headers)
            .body(prepared.body.clone())
            .send()
            .await
            .map_err(|e| self.send_failed(e, request_id))?;

        debug!("Response status: {} [request_id: {}]", response.status(), request_id);

        match self.provider.process_response(response, capability).await {
            Ok(parsed) => {
                self.health.mark(self.provider.name(), true);
                Ok(parsed)
            }
            Err(e) => {
                warn!(
                    "Request failed for {}: {} [request_id: {}]",
                    self.provider.name(),
                    e,
                    request_id
                );
                self.health.mark(self.provider.name(), false);
                Err(e.into())
            }
        }
    }

    async fn send(
        &self,
        cancel: &CancellationToken,
        prepared: &ProviderRequest,
        headers: HeaderMap,
        request_id: Uuid,
    ) -> ClientResult<Response> {
        let send = self
            .http
            .post(&prepared.url)
            .headers(headers)
            .body(prepared.body.clone())
            .send();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            result = send => result.map_err(|e| self.send_failed(e, request_id)),
        }
    }

    fn send_failed(&self, source: reqwest::Error, request_id: Uuid) -> ClientError {
        if source.is_timeout() {
            warn!(
                "Request timeout for {} [request_id: {}]",
                self.provider.name(),
                request_id
            );
        } else {
            error!(
                "Request error for {} [request_id: {}]: {}",
                self.provider.name(),
                request_id,
                source
            );
        }
        self.health.mark(self.provider.name(), false);
        ClientError::from_send(source, request_id)
    }
}

impl fmt::Debug for TransportClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportClient")
            .field("provider", &self.provider)
            .field("retry", &self.retry)
            .field("health", &self.health.snapshot())
            .finish()
    }
}
