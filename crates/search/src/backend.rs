//! Search backend abstraction.

use async_trait::async_trait;
use ragbench_core::{Result, ScoredDoc};

/// A retrieval backend serving chunk-level hits.
///
/// Both methods return hits whose `doc_id` is the *parent document* id of
/// the matching chunk, sorted by descending score. A document therefore
/// appears once per matching chunk; the pipeline collapses duplicates
/// through chunk aggregation.
///
/// Backend failures are per-call: the pipeline treats an `Err` as a failed
/// query, not a failed run.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Keyword (BM25) search over chunk text.
    async fn keyword_search(&self, query: &str, limit: usize) -> Result<Vec<ScoredDoc>>;

    /// Dense search by embedding similarity.
    async fn vector_search(&self, embedding: &[f32], limit: usize) -> Result<Vec<ScoredDoc>>;
}
