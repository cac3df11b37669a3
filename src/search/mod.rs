//! Hybrid local search: deterministic embeddings plus lexical scoring.

pub mod embedding;
pub mod engine;
pub mod store;

pub use embedding::{cosine_similarity, DeterministicEmbedder, EmbeddingBackend, EMBEDDING_DIM};
pub use engine::{SearchEngine, SearchFilters, SearchHit, CANDIDATE_CAP};
pub use store::{EmbeddingStore, ReindexOutcome};
