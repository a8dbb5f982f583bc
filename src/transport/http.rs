//! HTTP transport backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::{TransportError, TRANSITION_FAILED_DETAIL, UNKNOWN_ERROR_DETAIL};
use super::types::{
    CostReport, CreatedSession, ErrorBody, StateSnapshot, TimelineEvent, TimelineResponse,
    TransitionRequest, TransitionResult,
};
use super::Transport;
use crate::session::SessionId;

/// Default engine API root.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// Default per-request timeout. Transitions wait on text generation, so
/// this is generous.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Transport speaking JSON over HTTP to the engine.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport for the given API root with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a transport with a custom per-request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = Client::builder().timeout(timeout).build()?;
        Self::with_client(http, base_url)
    }

    /// Create a transport around an existing client.
    pub fn with_client(
        http: Client,
        base_url: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let raw = base_url.into();
        let base_url = Url::parse(raw.trim_end_matches('/'))
            .map_err(|_| TransportError::InvalidUrl(raw.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(raw));
        }
        Ok(Self { http, base_url })
    }

    /// The API root requests are sent to.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Endpoint URL below the API root. Each segment is percent-encoded,
    /// so session ids cannot escape their path position.
    fn url(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Decode a successful JSON body, or turn a non-2xx status into an error.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let response = response.error_for_status()?;
    Ok(response.json::<T>().await?)
}

/// Extract the rejection detail from a failed transition response.
async fn rejection(response: Response) -> TransportError {
    let status = response.status().as_u16();
    let detail = match response.json::<ErrorBody>().await {
        Ok(body) => body
            .detail_text()
            .unwrap_or_else(|| TRANSITION_FAILED_DETAIL.to_string()),
        Err(_) => UNKNOWN_ERROR_DETAIL.to_string(),
    };
    TransportError::Rejected { status, detail }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn create_session(&self) -> Result<CreatedSession, TransportError> {
        let response = self.http.post(self.url(&["session"])?).send().await?;
        let created: CreatedSession = decode(response).await?;
        debug!(session_id = %created.session_id, "session created");
        Ok(created)
    }

    async fn fetch_state(&self, id: &SessionId) -> Result<StateSnapshot, TransportError> {
        let response = self
            .http
            .get(self.url(&["session", id.as_str()])?)
            .send()
            .await?;
        decode(response).await
    }

    async fn submit_transition(
        &self,
        request: &TransitionRequest,
    ) -> Result<TransitionResult, TransportError> {
        let response = self
            .http
            .post(self.url(&["transition"])?)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        Ok(response.json::<TransitionResult>().await?)
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), TransportError> {
        self.http
            .delete(self.url(&["session", id.as_str()])?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn fetch_cost(&self, id: &SessionId) -> Result<CostReport, TransportError> {
        let response = self.http.get(self.url(&["cost", id.as_str()])?).send().await?;
        decode(response).await
    }

    async fn fetch_timeline(&self, id: &SessionId) -> Result<Vec<TimelineEvent>, TransportError> {
        let response = self
            .http
            .get(self.url(&["timeline", id.as_str()])?)
            .send()
            .await?;
        let body: TimelineResponse = decode(response).await?;
        Ok(body.timeline)
    }

    async fn health(&self) -> Result<(), TransportError> {
        self.http
            .get(self.url(&["health"])?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
