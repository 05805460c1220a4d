//! Decision search.
//!
//! - [`ranker`] - semantic ranking with a text fallback
//! - [`index`] - computing and backfilling decision embeddings
//! - [`snippet`] / [`answer`] - result presentation and answer synthesis

pub mod answer;
pub mod index;
pub mod ranker;
pub mod similarity;
pub mod snippet;

pub use index::{embed_decision, embed_pending, embedding_status, BackfillStats, EmbedMode, EmbeddingStatus};
pub use ranker::{
    rank, Ranker, SearchMode, SearchOptions, SearchOutcome, SearchResult, SearchSettings,
};
pub use similarity::cosine_similarity;
