use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};

use super::classifier::Classifier;
use super::embedding::Embedder;
use super::error::ClassifierError;
use crate::centroid_cache::CentroidCache;
use crate::registry::{CategoryConfig, CategoryRegistry, SHOW_AD_THRESHOLD};

/// A builder for constructing a Classifier with a fluent interface.
#[derive(Debug)]
pub struct ClassifierBuilder<E> {
    embedder: Option<E>,
    registry: Option<Arc<CategoryRegistry>>,
    cache_path: Option<PathBuf>,
    threshold: f32,
}

impl<E> Default for ClassifierBuilder<E> {
    fn default() -> Self {
        Self {
            embedder: None,
            registry: None,
            cache_path: None,
            threshold: SHOW_AD_THRESHOLD,
        }
    }
}

impl<E: Embedder> ClassifierBuilder<E> {
    /// Creates a builder using the built-in registry and the default threshold
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the embedding backend used for questions and seed phrases
    pub fn with_embedder(mut self, embedder: E) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Replaces the category registry.
    ///
    /// Without this the built-in registry is used.
    pub fn with_registry(mut self, registry: Arc<CategoryRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Adds a category on top of the current registry.
    ///
    /// The first call starts from the built-in registry unless
    /// [`with_registry`](Self::with_registry) was called before.
    ///
    /// # Errors
    /// Any `ValidationError` from [`CategoryRegistry::add_category`].
    pub fn add_category(mut self, category: CategoryConfig) -> Result<Self, ClassifierError> {
        let registry = self.registry.get_or_insert_with(CategoryRegistry::builtin);
        Arc::make_mut(registry).add_category(category)?;
        Ok(self)
    }

    /// Reads precomputed centroids from `path`.
    ///
    /// Entries are only used when the file was produced with the same model
    /// as the embedder.
    pub fn with_centroid_cache(mut self, path: impl AsRef<Path>) -> Self {
        self.cache_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the minimum similarity for showing an ad.
    ///
    /// # Errors
    /// `ValidationError` unless the threshold is a finite number in [-1, 1].
    pub fn with_threshold(mut self, threshold: f32) -> Result<Self, ClassifierError> {
        if !threshold.is_finite() || !(-1.0..=1.0).contains(&threshold) {
            return Err(ClassifierError::ValidationError(
                format!("Threshold must be between -1 and 1, got {}", threshold)
            ));
        }
        self.threshold = threshold;
        Ok(self)
    }

    /// Builds and returns the final Classifier instance
    ///
    /// # Errors
    /// `BuildError` if no embedder was set.
    pub fn build(self) -> Result<Classifier<E>, ClassifierError> {
        let embedder = self.embedder
            .ok_or_else(|| ClassifierError::BuildError("An embedder must be set".to_string()))?;
        let registry = self.registry.unwrap_or_else(CategoryRegistry::builtin);

        for key in registry.dangling_creatives() {
            warn!("Category '{}' references a creative that is not registered", key);
        }

        let cache = self.cache_path
            .map(|path| CentroidCache::new(path, embedder.model()));

        info!(
            "Classifier ready: {} categories, model {}, threshold {:.2}, cache {:?}",
            registry.len(),
            embedder.model(),
            self.threshold,
            cache.as_ref().map(|c| c.path())
        );

        Ok(Classifier {
            embedder,
            registry,
            cache,
            threshold: self.threshold,
        })
    }
}
