//! Offline centroid precomputation.
//!
//! All seed phrases of all categories are embedded with a single batch call,
//! the returned vectors are split back into per-category groups and each
//! group is averaged into a centroid.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use log::info;
use ndarray::Array1;

use crate::centroid_cache::{CentroidCache, CentroidsFile};
use crate::classifier::utils::average_vectors;
use crate::classifier::{ClassifierError, Embedder};
use crate::registry::CategoryRegistry;

/// Splits `vectors` into consecutive groups of the given sizes and averages each group.
///
/// # Errors
/// `PrecomputeError` when the sizes do not add up to the number of vectors or
/// the vectors disagree on their dimension.
pub fn centroids_from_groups(
    vectors: &[Array1<f32>],
    group_sizes: &[usize],
) -> Result<Vec<Array1<f32>>, ClassifierError> {
    let expected: usize = group_sizes.iter().sum();
    if expected != vectors.len() {
        return Err(ClassifierError::PrecomputeError(format!(
            "Expected {} embeddings, got {}",
            expected,
            vectors.len()
        )));
    }
    let dimension = vectors.first().map(|v| v.len()).unwrap_or(0);
    if let Some(pos) = vectors.iter().position(|v| v.len() != dimension) {
        return Err(ClassifierError::PrecomputeError(format!(
            "Embedding {} has {} dimensions, expected {}",
            pos + 1,
            vectors[pos].len(),
            dimension
        )));
    }

    let mut offset = 0;
    let mut centroids = Vec::with_capacity(group_sizes.len());
    for &size in group_sizes {
        let group = &vectors[offset..offset + size];
        offset += size;
        centroids.push(average_vectors(group, dimension));
    }
    Ok(centroids)
}

/// Computes the centroid of every category in `registry` with one batch embedding call.
pub async fn compute_centroids<E: Embedder>(
    embedder: &E,
    registry: &CategoryRegistry,
) -> Result<CentroidsFile, ClassifierError> {
    let group_sizes: Vec<usize> = registry
        .categories()
        .iter()
        .map(|c| c.seed_phrases.len())
        .collect();
    let phrases: Vec<String> = registry
        .categories()
        .iter()
        .flat_map(|c| c.seed_phrases.iter().cloned())
        .collect();
    if phrases.is_empty() {
        return Err(ClassifierError::PrecomputeError(
            "Registry has no seed phrases to embed".to_string(),
        ));
    }

    info!(
        "Embedding {} seed phrases across {} categories with {}",
        phrases.len(),
        registry.len(),
        embedder.model()
    );
    let vectors = embedder.embed_batch(&phrases).await?;
    let dimension = vectors.first().map(|v| v.len()).unwrap_or(0);
    let centroids = centroids_from_groups(&vectors, &group_sizes)?;

    Ok(CentroidsFile {
        model: embedder.model().to_string(),
        dimension,
        centroids: registry
            .categories()
            .iter()
            .zip(centroids)
            .map(|(category, centroid)| (category.key.clone(), centroid.to_vec()))
            .collect::<BTreeMap<_, _>>(),
        generated_at: Utc::now(),
    })
}

/// Computes all centroids and writes them to `path`, replacing any existing file.
pub async fn precompute_to<E: Embedder>(
    embedder: &E,
    registry: &CategoryRegistry,
    path: impl AsRef<Path>,
) -> Result<CentroidsFile, ClassifierError> {
    let file = compute_centroids(embedder, registry).await?;
    CentroidCache::new(path, embedder.model()).write(&file)?;
    Ok(file)
}
