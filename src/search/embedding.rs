//! Deterministic text embeddings.
//!
//! No model, no network: text is hashed into a seed and expanded through a
//! linear-congruential generator into a fixed-length unit vector. The same
//! text always yields the same vector, so query and document vectors are
//! directly comparable by cosine similarity, and nothing ever leaves the
//! device. A real model can be slotted in behind [`EmbeddingBackend`] without
//! touching the rest of the pipeline, as long as it returns normalized
//! vectors of the same dimension.

/// Embedding dimension, matching common small sentence-transformer models.
pub const EMBEDDING_DIM: usize = 384;

/// Strategy seam between the deterministic fallback and a future real model.
/// Implementations must be pure and total: same input, same output, no I/O.
pub trait EmbeddingBackend {
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// The default backend: hash-derived pseudo-random unit vectors.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeterministicEmbedder;

impl EmbeddingBackend for DeterministicEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        // Fold UTF-16 code units into a 32-bit seed.
        let mut seed: u32 = 0;
        for unit in text.encode_utf16() {
            seed = seed.wrapping_mul(31).wrapping_add(unit as u32);
        }

        // Expand via an LCG, mapping the low 16 bits of each step to [-1, 1].
        let mut vector = vec![0.0f32; EMBEDDING_DIM];
        for slot in vector.iter_mut() {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            *slot = (seed & 0xffff) as f32 / 65535.0 * 2.0 - 1.0;
        }

        // L2 normalize; a zero vector is left unchanged.
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        vector
    }
}

/// Cosine similarity between two vectors. Returns 0 for mismatched lengths
/// or zero-norm inputs, so a missing signal never becomes an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let backend = DeterministicEmbedder;
        let a = backend.embed("Schraubenzieher ist in der Schublade");
        let b = backend.embed("Schraubenzieher ist in der Schublade");
        let c = backend.embed("Kaufliste: Milch, Brot");

        assert_eq!(a, b); // bit-identical
        assert_ne!(a, c);
        assert_eq!(a.len(), EMBEDDING_DIM);
    }

    #[test]
    fn test_unit_norm() {
        let backend = DeterministicEmbedder;
        for text in ["hello world", "a", "日本語のテキスト", "🦀"] {
            let v = backend.embed(text);
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-4, "norm for {:?} was {}", text, norm);
        }
    }

    #[test]
    fn test_empty_string_is_unit_vector() {
        // Seed 0 still drives the LCG, so even "" embeds to a unit vector.
        let v = DeterministicEmbedder.embed("");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_separate_instances_agree() {
        let a = DeterministicEmbedder.embed("stable across instances");
        let b = DeterministicEmbedder.embed("stable across instances");
        assert_eq!(a, b);
    }

    #[test]
    fn test_cosine_self_similarity() {
        let v = DeterministicEmbedder.embed("anything at all");
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_basics() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let c = vec![-1.0, 0.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
        assert!((cosine_similarity(&a, &c) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0); // length mismatch
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0); // zero norm
    }
}
