//! HTTP providers for cloud model APIs.
//!
//! Speaks the OpenAI wire format for embeddings and chat completions and the
//! Cohere wire format for rerank. Every request retries with exponential
//! backoff on transient failures; the reqwest client carries a hard timeout
//! so a stuck call cannot wedge a pipeline request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::provider::{CompletionProvider, EmbeddingProvider, RerankHit, RerankProvider};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_MAX_RETRIES: u32 = 3;

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

async fn backoff(attempt: u32) {
    let delay = Duration::from_millis(100 * 2u64.pow(attempt - 1));
    tokio::time::sleep(delay).await;
}

/// Extract a typed body from a response, mapping non-2xx to [`Error::Status`].
async fn read_json<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Status {
            status: status.as_u16(),
            body,
        });
    }
    resp.json::<T>()
        .await
        .map_err(|e| Error::MalformedResponse(e.to_string()))
}

/// Retryable: network errors and 429/5xx. Schema errors are not retried.
fn is_retryable(err: &Error) -> bool {
    match err {
        Error::Http(_) => true,
        Error::Status { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

// ==================== Embeddings ====================

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

/// OpenAI-compatible `/v1/embeddings` client.
pub struct HttpEmbeddings {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_retries: u32,
}

impl HttpEmbeddings {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(attempt, "retrying embedding request");
                backoff(attempt).await;
            }

            let body = EmbedRequest {
                model: &self.model,
                input,
            };

            let result = match self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => read_json::<EmbedResponse>(resp).await,
                Err(e) => Err(Error::Http(e)),
            };

            match result {
                Ok(resp) => {
                    if resp.data.len() != input.len() {
                        return Err(Error::MalformedResponse(format!(
                            "expected {} embeddings, got {}",
                            input.len(),
                            resp.data.len()
                        )));
                    }
                    return Ok(resp.data.into_iter().map(|d| d.embedding).collect());
                }
                Err(e) if is_retryable(&e) => {
                    warn!(error = %e, attempt, "embedding request failed");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Unavailable("embedding provider".to_string())))
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(std::slice::from_ref(&text.to_string())).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::MalformedResponse("empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }
}

// ==================== Completion ====================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// OpenAI-compatible `/v1/chat/completions` client, temperature pinned to 0
/// so query generation and variant judgements stay as stable as the model
/// allows.
pub struct HttpCompletion {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_retries: u32,
}

impl HttpCompletion {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }
}

#[async_trait]
impl CompletionProvider for HttpCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(attempt, "retrying completion request");
                backoff(attempt).await;
            }

            let body = ChatRequest {
                model: &self.model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
                temperature: 0.0,
            };

            let result = match self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => read_json::<ChatResponse>(resp).await,
                Err(e) => Err(Error::Http(e)),
            };

            match result {
                Ok(resp) => {
                    return resp
                        .choices
                        .into_iter()
                        .next()
                        .map(|c| c.message.content)
                        .ok_or_else(|| Error::MalformedResponse("no choices in response".to_string()));
                }
                Err(e) if is_retryable(&e) => {
                    warn!(error = %e, attempt, "completion request failed");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Unavailable("completion provider".to_string())))
    }
}

// ==================== Rerank ====================

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

#[derive(Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f32,
}

/// Cohere-compatible `/v1/rerank` client.
pub struct HttpReranker {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_retries: u32,
}

impl HttpReranker {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }
}

#[async_trait]
impl RerankProvider for HttpReranker {
    async fn rerank(&self, query: &str, documents: &[String], top_n: usize) -> Result<Vec<RerankHit>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(attempt, "retrying rerank request");
                backoff(attempt).await;
            }

            let body = RerankRequest {
                model: &self.model,
                query,
                documents,
                top_n,
            };

            let result = match self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => read_json::<RerankResponse>(resp).await,
                Err(e) => Err(Error::Http(e)),
            };

            match result {
                Ok(resp) => {
                    // Preserve the reranker's ordering as-is.
                    return Ok(resp
                        .results
                        .into_iter()
                        .map(|r| RerankHit {
                            index: r.index,
                            score: r.relevance_score,
                        })
                        .collect());
                }
                Err(e) if is_retryable(&e) => {
                    warn!(error = %e, attempt, "rerank request failed");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Unavailable("rerank provider".to_string())))
    }
}
