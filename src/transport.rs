//! Agent transport - the HTTP contract with the external completion service.
//!
//! Each agent lives behind `POST /{agent_id}/sessions` and
//! `POST /{agent_id}/completions`. Every response is wrapped in a
//! `{ code, data, message }` envelope; any non-zero code is an
//! application-level rejection. Timeout policy lives here, on the reqwest
//! client, not in the orchestrator.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors from transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service rejected request (code {code}): {message}")]
    Api { code: i64, message: String },

    #[error("response envelope carried no data")]
    EmptyPayload,
}

/// A completion request for a single agent.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub question: String,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl CompletionRequest {
    pub fn new(question: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            question: question.into(),
            stream: false,
            session_id,
        }
    }
}

/// A completed answer from an agent.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    /// The answer text.
    pub answer: String,
    /// New session handle, when the service issued one.
    pub session_id: Option<String>,
    /// Knowledge-base citation chunks, passed through for presentation.
    pub reference_chunks: Vec<Value>,
}

/// Transport seam between the orchestrator and the completion service.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Create a conversation session for an agent, returning its id.
    async fn create_session(&self, agent_id: &str, name: &str)
        -> Result<String, TransportError>;

    /// Send a question to an agent and await its answer.
    async fn complete(
        &self,
        agent_id: &str,
        request: CompletionRequest,
    ) -> Result<Completion, TransportError>;
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    code: i64,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    fn into_data(self) -> Result<T, TransportError> {
        if self.code != 0 {
            return Err(TransportError::Api {
                code: self.code,
                message: self.message.unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        self.data.ok_or(TransportError::EmptyPayload)
    }
}

#[derive(Debug, Default, Deserialize)]
struct SessionData {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionData {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    reference: Option<ReferenceData>,
}

#[derive(Debug, Deserialize)]
struct ReferenceData {
    #[serde(default)]
    chunks: Vec<Value>,
}

/// HTTP implementation of [`AgentTransport`].
pub struct HttpTransport {
    base_url: String,
    api_token: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self::with_timeout(base_url, api_token, Duration::from_secs(300))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            client,
        }
    }

    fn url(&self, agent_id: &str, endpoint: &str) -> String {
        format!("{}/{}/{}", self.base_url, agent_id, endpoint)
    }
}

#[async_trait]
impl AgentTransport for HttpTransport {
    async fn create_session(
        &self,
        agent_id: &str,
        name: &str,
    ) -> Result<String, TransportError> {
        let envelope: ApiEnvelope<SessionData> = self
            .client
            .post(self.url(agent_id, "sessions"))
            .bearer_auth(&self.api_token)
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await?
            .json()
            .await?;
        Ok(envelope.into_data()?.id)
    }

    async fn complete(
        &self,
        agent_id: &str,
        request: CompletionRequest,
    ) -> Result<Completion, TransportError> {
        let envelope: ApiEnvelope<CompletionData> = self
            .client
            .post(self.url(agent_id, "completions"))
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await?
            .json()
            .await?;
        let data = envelope.into_data()?;
        Ok(Completion {
            answer: data.answer.unwrap_or_else(|| "(no reply)".to_string()),
            session_id: data.session_id,
            reference_chunks: data.reference.map(|r| r.chunks).unwrap_or_default(),
        })
    }
}
