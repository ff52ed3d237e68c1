#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use adslot::{Embedder, EmbeddingError};
use env_logger::{Builder, Env};
use ndarray::Array1;

pub const TEST_MODEL: &str = "keyword-test-model";

// Initialize test logger
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

/// Deterministic embedder: one axis per keyword group, plus a small constant
/// axis so no text embeds to the zero vector.
#[derive(Clone)]
pub struct KeywordEmbedder {
    model: String,
    axes: Vec<Vec<String>>,
    embed_calls: Arc<AtomicUsize>,
    batch_calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<String>>>,
    fail_after: Option<usize>,
}

impl KeywordEmbedder {
    pub fn new(model: &str, axes: Vec<Vec<&str>>) -> Self {
        Self {
            model: model.to_string(),
            axes: axes
                .into_iter()
                .map(|words| words.into_iter().map(String::from).collect())
                .collect(),
            embed_calls: Arc::new(AtomicUsize::new(0)),
            batch_calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
            fail_after: None,
        }
    }

    /// Makes every `embed` call after the first `calls` fail
    pub fn failing_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self
    }

    /// Axes matching the four built-in medical categories
    pub fn medical() -> Self {
        Self::medical_with_model(TEST_MODEL)
    }

    pub fn medical_with_model(model: &str) -> Self {
        Self::new(
            model,
            vec![
                vec!["pancrea", "folfirinox", "gemcitabine"],
                vec!["breast", "her2", "aromatase", "cdk4/6"],
                vec![
                    "arthritis", "rheumatoid", "dmard", "jak", "tnf", "synovitis",
                    "spondyl", "methotrexate", "joint",
                ],
                vec!["vaccin", "immuniz", "booster", "shingles", "rsv"],
            ],
        )
    }

    pub fn dimension(&self) -> usize {
        self.axes.len() + 1
    }

    pub fn vector_for(&self, text: &str) -> Array1<f32> {
        let lower = text.to_lowercase();
        let mut values: Vec<f32> = self
            .axes
            .iter()
            .map(|words| words.iter().filter(|w| lower.contains(w.as_str())).count() as f32)
            .collect();
        values.push(0.25);
        Array1::from_vec(values)
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Texts passed to `embed`, in call order
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl Embedder for KeywordEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Array1<f32>, EmbeddingError> {
        let previous = self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| previous >= limit) {
            return Err(EmbeddingError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        self.seen.lock().unwrap().push(text.to_string());
        Ok(self.vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Array1<f32>>, EmbeddingError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

/// Embedder whose every call fails like an unreachable service.
pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn model(&self) -> &str {
        TEST_MODEL
    }

    async fn embed(&self, _text: &str) -> Result<Array1<f32>, EmbeddingError> {
        Err(EmbeddingError::Status {
            status: 401,
            body: "invalid api key".to_string(),
        })
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Array1<f32>>, EmbeddingError> {
        Err(EmbeddingError::Status {
            status: 429,
            body: "rate limited".to_string(),
        })
    }
}
