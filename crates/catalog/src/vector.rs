//! Vector similarity utilities.
//!
//! Pure-Rust cosine similarity plus a brute-force nearest-neighbour ranking
//! shared by every vector store backend.

use skillroute_core::ScoredId;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Cosine distance: `1 - similarity`, in [0, 2].
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Rank `(id, vector)` pairs by ascending cosine distance to `query`.
///
/// Equal distances keep their input order.
pub fn nearest<'a, I>(vectors: I, query: &[f32], k: usize) -> Vec<ScoredId>
where
    I: IntoIterator<Item = (&'a String, &'a Vec<f32>)>,
{
    let mut scored: Vec<ScoredId> = vectors
        .into_iter()
        .map(|(id, vector)| ScoredId {
            id: id.clone(),
            distance: cosine_distance(vector, query),
        })
        .collect();

    scored.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}
