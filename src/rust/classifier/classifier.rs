use std::sync::Arc;

use log::{debug, info, warn};
use ndarray::Array1;

use super::embedding::{Embedder, EmbeddingError, OpenAiEmbedder};
use super::error::ClassifierError;
use super::utils::{average_vectors, cosine_similarity};
use super::{ClassificationResult, ClassifierInfo, REASON_BELOW_THRESHOLD, REASON_NO_MATCH};
use crate::centroid_cache::CentroidCache;
use crate::registry::{CategoryConfig, CategoryRegistry};

/// Nearest-centroid ad classifier.
///
/// A question is embedded and compared with the centroid of every registered
/// category. The closest category wins when its similarity reaches the
/// threshold.
///
/// Centroids come from the precomputed cache when it holds a usable entry;
/// otherwise they are recomputed from the seed phrases on every call.
///
/// ```no_run
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// use adslot::{Classifier, OpenAiEmbedder, CentroidCache};
///
/// let classifier = Classifier::builder()
///     .with_embedder(OpenAiEmbedder::from_env())
///     .with_centroid_cache(CentroidCache::default_path())
///     .build()?;
///
/// let result = classifier.classify("What are the options for HER2+ breast cancer?").await?;
/// println!("{:?} ({:.2})", result.category, result.confidence);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Classifier<E> {
    pub(crate) embedder: E,
    pub(crate) registry: Arc<CategoryRegistry>,
    pub(crate) cache: Option<CentroidCache>,
    pub(crate) threshold: f32,
}

// Compile-time verification of thread-safety
#[allow(dead_code)]
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier<OpenAiEmbedder>>();
    }
};

impl<E: Embedder> Classifier<E> {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder<E> {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            model: self.embedder.model().to_string(),
            num_categories: self.registry.len(),
            category_keys: self.registry.categories().iter().map(|c| c.key.clone()).collect(),
            threshold: self.threshold,
            cache_path: self.cache.as_ref().map(|c| c.path().to_path_buf()),
        }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Similarity of the question to every category, in registry order.
    ///
    /// # Errors
    /// `ServiceError` if any embedding call fails. Nothing partial is returned.
    pub async fn scores(&self, question: &str) -> Result<Vec<(String, f32)>, ClassifierError> {
        let normalized = question.to_lowercase();
        let question_vector = self.embedder.embed(&normalized).await?;
        let dimension = question_vector.len();

        let mut scores = Vec::with_capacity(self.registry.len());
        for category in self.registry.categories() {
            let centroid = self.category_centroid(category, dimension).await?;
            let score = cosine_similarity(&question_vector, &centroid);
            debug!("Category '{}' scored {:.4}", category.key, score);
            scores.push((category.key.clone(), score));
        }
        Ok(scores)
    }

    /// Decides whether to show an ad for `question`, and which one.
    ///
    /// Ties go to the category enumerated first.
    pub async fn classify(&self, question: &str) -> Result<ClassificationResult, ClassifierError> {
        let scores = self.scores(question).await?;
        Ok(self.decide(&scores))
    }

    /// Picks the result for scores already produced by [`Classifier::scores`].
    pub fn decide(&self, scores: &[(String, f32)]) -> ClassificationResult {
        let mut best: Option<&str> = None;
        let mut best_score = -1.0_f32;
        for (key, score) in scores {
            if *score > best_score {
                best_score = *score;
                best = Some(key.as_str());
            }
        }

        let Some(best_key) = best else {
            info!("No category candidate for question");
            return ClassificationResult::no_ad(0.0, REASON_NO_MATCH);
        };

        if best_score >= self.threshold {
            if let Some(category) = self.registry.category(best_key) {
                info!("Matched '{}' ({}) with confidence {:.4}", category.key, category.sponsor, best_score);
                return ClassificationResult {
                    category: Some(category.key.clone()),
                    sponsor: Some(category.sponsor.clone()),
                    creative_id: Some(category.creative_id.clone()),
                    confidence: best_score,
                    blocked: false,
                    reason: None,
                };
            }
        }

        info!(
            "Best category '{}' at {:.4} is below threshold {:.2}",
            best_key, best_score, self.threshold
        );
        ClassificationResult::no_ad(best_score, REASON_BELOW_THRESHOLD)
    }

    async fn category_centroid(
        &self,
        category: &CategoryConfig,
        dimension: usize,
    ) -> Result<Array1<f32>, ClassifierError> {
        if let Some(cache) = &self.cache {
            if let Some(centroid) = cache.try_load_centroid(&category.key).await {
                if centroid.len() == dimension {
                    debug!("Using cached centroid for '{}'", category.key);
                    return Ok(centroid);
                }
                warn!(
                    "Cached centroid for '{}' has {} dimensions, expected {}; recomputing",
                    category.key,
                    centroid.len(),
                    dimension
                );
            }
        }

        debug!(
            "Computing centroid for '{}' from {} seed phrases",
            category.key,
            category.seed_phrases.len()
        );
        let mut vectors = Vec::with_capacity(category.seed_phrases.len());
        for phrase in &category.seed_phrases {
            let vector = self.embedder.embed(phrase).await?;
            if vector.len() != dimension {
                return Err(ClassifierError::ServiceError(EmbeddingError::MalformedResponse(
                    format!(
                        "seed phrase embedding has {} dimensions, question has {}",
                        vector.len(),
                        dimension
                    ),
                )));
            }
            vectors.push(vector);
        }
        Ok(average_vectors(&vectors, dimension))
    }
}
