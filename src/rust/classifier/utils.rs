use ndarray::Array1;

/// Cosine of the angle between two vectors.
///
/// Returns 0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();
    if norm_a <= 1e-10 || norm_b <= 1e-10 {
        return 0.0;
    }
    a.dot(b) / (norm_a * norm_b)
}

/// Component-wise arithmetic mean of equally sized vectors.
pub fn average_vectors(vectors: &[Array1<f32>], embedding_size: usize) -> Array1<f32> {
    if vectors.is_empty() {
        return Array1::zeros(embedding_size);
    }
    let sum = vectors.iter().fold(Array1::zeros(vectors[0].len()), |acc, v| acc + v);
    sum / vectors.len() as f32
}
