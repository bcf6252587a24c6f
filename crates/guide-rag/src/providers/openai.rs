//! OpenAI-compatible providers for embeddings and chat completions
//!
//! One HTTP client with an explicit request timeout and bounded retries is
//! shared by the embedder and the chat model.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ApiKey, LlmConfig};
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;
use super::retry::RetryPolicy;

/// Which hosted capability a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Service {
    Embedding,
    Chat,
}

impl Service {
    fn error(self, message: String) -> Error {
        match self {
            Service::Embedding => Error::Embedding(message),
            Service::Chat => Error::Llm(message),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Service::Embedding => "Embedding request",
            Service::Chat => "Chat completion",
        }
    }
}

/// Single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

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
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

/// Map a non-success response to an error.
///
/// `insufficient_quota` arrives as 429 but will not clear on retry, so it is
/// reported as a plain service error rather than a rate limit.
fn classify_status(service: Service, status: StatusCode, body: &str) -> Error {
    let (message, code) = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => (parsed.error.message, parsed.error.code.or(parsed.error.kind)),
        Err(_) => (body.trim().to_string(), None),
    };
    let detail = format!("HTTP {} - {}", status.as_u16(), message);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS if code.as_deref() == Some("insufficient_quota") => {
            service.error(detail)
        }
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited(detail),
        s if s.is_server_error() => Error::Unavailable(detail),
        _ => service.error(detail),
    }
}

/// Put embeddings back in input order; indices must be exactly `0..expected`
fn order_embeddings(mut response: EmbedResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    if response.data.len() != expected {
        return Err(Error::embedding(format!(
            "Expected {} embeddings, got {}",
            expected,
            response.data.len()
        )));
    }
    response.data.sort_by_key(|d| d.index);
    if let Some((position, item)) = response
        .data
        .iter()
        .enumerate()
        .find(|(position, item)| item.index != *position)
    {
        return Err(Error::embedding(format!(
            "Embedding response has index {} at position {}; expected indices 0..{}",
            item.index, position, expected
        )));
    }
    Ok(response.data.into_iter().map(|d| d.embedding).collect())
}

/// OpenAI-compatible API client with timeout and retry
pub struct OpenAiClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: LlmConfig,
    /// Bearer credential
    api_key: ApiKey,
    /// Retry policy for transient failures
    retry: RetryPolicy,
}

impl OpenAiClient {
    /// Create a new client; the configured timeout applies to every request
    pub fn new(config: &LlmConfig, api_key: ApiKey) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
            retry: RetryPolicy::new(config.max_retries, Duration::from_secs(1)),
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn send_error(&self, service: Service, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout(format!(
                "{} exceeded {}s",
                service.label(),
                self.config.timeout_secs
            ))
        } else {
            Error::Http(err)
        }
    }

    /// Embed texts, splitting into requests of `embed_batch_size` inputs
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.config.embed_batch_size.max(1)) {
            let vectors = self
                .retry
                .run(Service::Embedding.label(), || self.embed_request(batch))
                .await?;
            embeddings.extend(vectors);
        }

        Ok(embeddings)
    }

    async fn embed_request(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbedRequest {
            model: &self.config.embed_model,
            input: batch,
        };

        let response = self
            .client
            .post(self.url("embeddings"))
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(Service::Embedding, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(Service::Embedding, status, &body));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Failed to parse embedding response: {}", e)))?;

        order_embeddings(parsed, batch.len())
    }

    /// Run a chat completion at the configured temperature
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        tracing::info!("Generating answer with model: {}", self.config.chat_model);

        self.retry
            .run(Service::Chat.label(), || self.chat_request(messages))
            .await
    }

    async fn chat_request(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.chat_model,
            messages,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(Service::Chat, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(Service::Chat, status, &body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse chat response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::llm("Chat completion returned no content"))
    }
}

/// Embedding provider backed by the hosted `/embeddings` endpoint
pub struct OpenAiEmbedder {
    client: Arc<OpenAiClient>,
}

impl OpenAiEmbedder {
    pub fn from_client(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client
            .embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| Error::embedding("Empty embedding response"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.client.embed_batch(texts).await
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Chat model provider for grounded answers
pub struct OpenAiLlm {
    client: Arc<OpenAiClient>,
}

impl OpenAiLlm {
    pub fn from_client(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }

    fn messages(question: &str, context: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(PromptBuilder::build_system_prompt(context)),
            ChatMessage::user(question),
        ]
    }
}

#[async_trait]
impl LlmProvider for OpenAiLlm {
    async fn generate_answer(&self, question: &str, context: &str) -> Result<String> {
        self.client.chat(&Self::messages(question, context)).await
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.client.config().chat_model
    }
}

/// Combined provider that shares a single client for both embeddings and chat
pub struct OpenAiProvider {
    embedder: OpenAiEmbedder,
    llm: OpenAiLlm,
}

impl OpenAiProvider {
    /// Create a new combined provider
    pub fn new(config: &LlmConfig, api_key: ApiKey) -> Result<Self> {
        let client = Arc::new(OpenAiClient::new(config, api_key)?);
        Ok(Self {
            embedder: OpenAiEmbedder::from_client(Arc::clone(&client)),
            llm: OpenAiLlm::from_client(client),
        })
    }

    /// Split into separate providers
    pub fn split(self) -> (OpenAiEmbedder, OpenAiLlm) {
        (self.embedder, self.llm)
    }
}
