use std::path::PathBuf;

use serde::{Deserialize, Serialize};

mod error;
pub mod embedding;
#[allow(clippy::module_inception)]
mod classifier;
pub mod builder;
pub mod utils;

pub use error::ClassifierError;
pub use embedding::{Embedder, EmbeddingConfig, EmbeddingError, OpenAiEmbedder};
pub use classifier::Classifier;
pub use builder::ClassifierBuilder;

/// Reason reported when the registry produced no candidate at all
pub const REASON_NO_MATCH: &str = "No category match";
/// Reason reported when the best candidate scored under the threshold
pub const REASON_BELOW_THRESHOLD: &str = "Below threshold";

/// Outcome of classifying one question.
///
/// `category`, `sponsor` and `creative_id` are either all present (an ad
/// should be shown) or all absent, in which case `reason` says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sponsor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub creative_id: Option<String>,
    /// Raw cosine similarity of the best category
    pub confidence: f32,
    /// Reserved for a moderation step; never set by the classifier
    pub blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,
}

impl ClassificationResult {
    pub(crate) fn no_ad(confidence: f32, reason: &str) -> Self {
        Self {
            category: None,
            sponsor: None,
            creative_id: None,
            confidence,
            blocked: false,
            reason: Some(reason.to_string()),
        }
    }

    /// Whether a category cleared the threshold
    pub fn is_match(&self) -> bool {
        self.category.is_some()
    }
}

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Embedding model used for questions and seed phrases
    pub model: String,
    /// Number of registered categories
    pub num_categories: usize,
    /// Category keys in enumeration order
    pub category_keys: Vec<String>,
    /// Minimum similarity for showing an ad
    pub threshold: f32,
    /// Location of the precomputed centroid file, if one is configured
    pub cache_path: Option<PathBuf>,
}
