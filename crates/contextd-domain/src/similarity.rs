//! Cosine similarity, computed defensively (spec §4.9 step 3): shared by
//! the embedded vector store's brute-force search and the distiller's
//! clustering pass so both apply exactly the same edge-case handling.

/// Cosine similarity between two vectors, clamped to `[-1, 1]`.
///
/// Returns `0.0` if the vectors differ in length or either has zero
/// magnitude, rather than panicking or producing `NaN`.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}
