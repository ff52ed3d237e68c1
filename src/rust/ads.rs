//! Turns a classification into the ad a caller should render.

use serde::{Deserialize, Serialize};

use crate::classifier::{ClassificationResult, Classifier, ClassifierError, Embedder};
use crate::registry::{CategoryRegistry, Creative};

/// A classification merged with the creative to display, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdResponse {
    #[serde(flatten)]
    pub result: ClassificationResult,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub creative: Option<Creative>,
}

impl AdResponse {
    /// Resolves the creative for `result`.
    ///
    /// Blocked results never carry a creative. An unknown creative id yields
    /// no creative rather than an error.
    pub fn resolve(result: ClassificationResult, registry: &CategoryRegistry) -> Self {
        let creative = if result.blocked {
            None
        } else {
            result
                .creative_id
                .as_deref()
                .and_then(|id| registry.creative(id))
                .cloned()
        };
        Self { result, creative }
    }

    /// Whether there is an ad to render
    pub fn should_render(&self) -> bool {
        self.creative.is_some() && !self.result.blocked && self.result.sponsor.is_some()
    }
}

/// Checks a caller-supplied question before it reaches the classifier.
///
/// # Errors
/// `InvalidQuestion` if the question is missing or empty. Whitespace is a
/// question like any other and goes on to be classified.
pub fn validate_question(question: Option<&str>) -> Result<&str, ClassifierError> {
    match question {
        None => Err(ClassifierError::InvalidQuestion("question is required".into())),
        Some("") => Err(ClassifierError::InvalidQuestion("question cannot be empty".into())),
        Some(q) => Ok(q),
    }
}

/// Validates, classifies and resolves the creative in one step.
pub async fn select_ad<E: Embedder>(
    classifier: &Classifier<E>,
    question: Option<&str>,
) -> Result<AdResponse, ClassifierError> {
    let question = validate_question(question)?;
    let result = classifier.classify(question).await?;
    Ok(AdResponse::resolve(result, classifier.registry()))
}
