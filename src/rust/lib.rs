//! Embedding-based ad classifier for medical questions.
//!
//! A question is embedded with an external embedding service and compared
//! with one centroid per sponsored category. When the closest category is
//! similar enough, its sponsor's creative is selected.
//!
//! # Basic Usage
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use adslot::{Classifier, OpenAiEmbedder, CentroidCache, AdResponse};
//!
//! let classifier = Classifier::builder()
//!     .with_embedder(OpenAiEmbedder::from_env())
//!     .with_centroid_cache(CentroidCache::default_path())
//!     .build()?;
//!
//! let result = classifier.classify("Is there a new shingles vaccine for adults?").await?;
//! let response = AdResponse::resolve(result, classifier.registry());
//! if let Some(creative) = &response.creative {
//!     println!("{}", creative);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Precomputed centroids
//!
//! Without a centroid file every classification re-embeds every seed phrase.
//! [`precompute::precompute_to`] embeds them once, in a single batch, and
//! writes the file the classifier reads.

pub mod ads;
pub mod centroid_cache;
pub mod classifier;
pub mod precompute;
pub mod registry;

pub use ads::{select_ad, validate_question, AdResponse};
pub use centroid_cache::{CacheError, CacheLookup, CentroidCache, CentroidsFile};
pub use classifier::{
    ClassificationResult, Classifier, ClassifierBuilder, ClassifierError, ClassifierInfo,
    Embedder, EmbeddingConfig, EmbeddingError, OpenAiEmbedder,
};
pub use classifier::utils::{average_vectors, cosine_similarity};
pub use registry::{CategoryConfig, CategoryRegistry, Creative, SHOW_AD_THRESHOLD};

pub fn init_logger() {
    env_logger::init();
}
