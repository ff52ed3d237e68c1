use std::env;
use std::fmt;
use std::future::Future;

use log::debug;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const MODEL_ENV: &str = "ADSLOT_EMBEDDING_MODEL";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Missing API key: set {0}")]
    MissingApiKey(&'static str),
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Embedding service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

/// Converts text into fixed-length vectors.
///
/// Every call is a single round-trip to whatever backs the embedder. Nothing
/// is retried or cached here; callers decide on retry policy.
pub trait Embedder: Send + Sync {
    /// Identifier of the model producing the vectors. Precomputed centroids
    /// are only trusted when they were produced by the same model.
    fn model(&self) -> &str;

    /// Embeds a single text.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Array1<f32>, EmbeddingError>> + Send;

    /// Embeds many texts in one call, returning one vector per input in input order.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Array1<f32>>, EmbeddingError>> + Send;
}

/// Connection settings for an OpenAI-compatible `/embeddings` endpoint.
#[derive(Clone)]
pub struct EmbeddingConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl EmbeddingConfig {
    /// Reads the credential, base URL and model from the environment.
    ///
    /// A missing credential is not an error here; it surfaces as
    /// [`EmbeddingError::MissingApiKey`] on the first request.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = env::var(API_KEY_ENV) {
            if !key.is_empty() {
                config.api_key = Some(key);
            }
        }
        if let Ok(url) = env::var(BASE_URL_ENV) {
            if !url.is_empty() {
                config.base_url = url;
            }
        }
        if let Ok(model) = env::var(MODEL_ENV) {
            if !model.is_empty() {
                config.model = model;
            }
        }
        config
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: EmbeddingInput<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum EmbeddingInput<'a> {
    Single(&'a str),
    Batch(&'a [String]),
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

/// Parses an `/embeddings` response body, ordering items by their `index`.
pub(crate) fn parse_embedding_response(body: &str) -> Result<Vec<Array1<f32>>, EmbeddingError> {
    let mut response: EmbeddingResponse = serde_json::from_str(body)
        .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;
    if response.data.iter().all(|item| item.index.is_some()) {
        response.data.sort_by_key(|item| item.index);
    }
    Ok(response
        .data
        .into_iter()
        .map(|item| Array1::from_vec(item.embedding))
        .collect())
}

/// Embedding client for the OpenAI embeddings API and compatible servers.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    config: EmbeddingConfig,
    client: reqwest::Client,
}

impl OpenAiEmbedder {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Creates a client configured from the environment
    pub fn from_env() -> Self {
        Self::new(EmbeddingConfig::from_env())
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    async fn request(&self, input: EmbeddingInput<'_>) -> Result<Vec<Array1<f32>>, EmbeddingError> {
        let api_key = self.config.api_key.as_deref()
            .ok_or(EmbeddingError::MissingApiKey(API_KEY_ENV))?;

        let payload = EmbeddingRequest {
            model: &self.config.model,
            input,
        };
        let response = self.client
            .post(self.config.endpoint())
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_embedding_response(&body)
    }
}

impl Embedder for OpenAiEmbedder {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn embed(&self, text: &str) -> Result<Array1<f32>, EmbeddingError> {
        debug!("Embedding text ({} chars) with {}", text.len(), self.config.model);
        let mut vectors = self.request(EmbeddingInput::Single(text)).await?;
        if vectors.len() != 1 {
            return Err(EmbeddingError::CountMismatch {
                expected: 1,
                actual: vectors.len(),
            });
        }
        Ok(vectors.remove(0))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Array1<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Embedding batch of {} texts with {}", texts.len(), self.config.model);
        let vectors = self.request(EmbeddingInput::Batch(texts)).await?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            });
        }
        Ok(vectors)
    }
}
