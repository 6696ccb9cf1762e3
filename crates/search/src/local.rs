//! In-process backend over files on disk.
//!
//! Serves keyword search from an in-memory BM25 index and dense search from
//! brute-force cosine similarity over precomputed chunk embeddings. Intended
//! for benchmark-sized subsets; nothing here is approximate.

use crate::backend::SearchBackend;
use async_trait::async_trait;
use ragbench_core::{ChunkRecord, Document, Error, Result, ScoredDoc};
use ragbench_retrieval::{Bm25Index, Tokenizer};
use std::collections::HashMap;

/// Backend over an indexed chunk collection, or over whole documents when
/// no embeddings are available (keyword-only).
pub struct LocalBackend {
    index: Bm25Index,
    /// BM25 hit id -> parent document id. Identity for whole-document mode.
    parents: HashMap<String, String>,
    /// (parent doc id, embedding) per chunk; empty in whole-document mode.
    embeddings: Vec<(String, Vec<f32>)>,
}

impl LocalBackend {
    /// Build from chunk records with embeddings. Both search methods work.
    pub fn from_chunks(chunks: Vec<ChunkRecord>) -> Self {
        let index = Bm25Index::build(
            chunks
                .iter()
                .map(|chunk| (chunk.id.clone(), chunk.text.clone())),
            Tokenizer::whitespace(),
        );
        let parents = chunks
            .iter()
            .map(|chunk| (chunk.id.clone(), chunk.doc_id.clone()))
            .collect();
        let embeddings = chunks
            .into_iter()
            .map(|chunk| (chunk.doc_id, chunk.embedding))
            .collect();
        Self {
            index,
            parents,
            embeddings,
        }
    }

    /// Build from whole documents. Only keyword search is available.
    pub fn from_corpus(docs: Vec<Document>) -> Self {
        let index = Bm25Index::build(
            docs.iter().map(|doc| (doc.id.clone(), doc.full_text())),
            Tokenizer::whitespace(),
        );
        let parents = docs.iter().map(|doc| (doc.id.clone(), doc.id.clone())).collect();
        Self {
            index,
            parents,
            embeddings: Vec::new(),
        }
    }
}

#[async_trait]
impl SearchBackend for LocalBackend {
    async fn keyword_search(&self, query: &str, limit: usize) -> Result<Vec<ScoredDoc>> {
        Ok(self
            .index
            .top(query, limit)
            .into_iter()
            .map(|hit| {
                let parent = self
                    .parents
                    .get(&hit.doc_id)
                    .cloned()
                    .unwrap_or(hit.doc_id);
                ScoredDoc::new(parent, hit.score)
            })
            .collect())
    }

    async fn vector_search(&self, embedding: &[f32], limit: usize) -> Result<Vec<ScoredDoc>> {
        if self.embeddings.is_empty() {
            return Err(Error::backend(
                "vector search requires chunk embeddings; backend was built from a corpus only",
            ));
        }

        let mut hits = Vec::with_capacity(self.embeddings.len());
        for (doc_id, chunk_embedding) in &self.embeddings {
            if chunk_embedding.len() != embedding.len() {
                return Err(Error::backend(format!(
                    "embedding dimension mismatch: query {} vs chunk {}",
                    embedding.len(),
                    chunk_embedding.len()
                )));
            }
            hits.push(ScoredDoc::new(
                doc_id.clone(),
                cosine_similarity(embedding, chunk_embedding),
            ));
        }
        // Stable sort keeps chunk file order for equal scores.
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        Ok(hits)
    }
}

/// Cosine similarity of two vectors; 0.0 when either has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        dot += x as f64 * y as f64;
        norm_a += x as f64 * x as f64;
        norm_b += y as f64 * y as f64;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunk(id: &str, doc_id: &str, index: usize, text: &str, embedding: Vec<f32>) -> ChunkRecord {
        ChunkRecord {
            id: id.to_string(),
            doc_id: doc_id.to_string(),
            chunk_index: index,
            text: text.to_string(),
            embedding,
        }
    }

    fn toy_backend() -> LocalBackend {
        LocalBackend::from_chunks(vec![
            chunk("d1#chunk0", "d1", 0, "rust memory safety", vec![1.0, 0.0]),
            chunk("d1#chunk1", "d1", 1, "borrow checker rules", vec![0.9, 0.1]),
            chunk("d2#chunk0", "d2", 0, "python garbage collection", vec![0.0, 1.0]),
        ])
    }

    #[test]
    fn test_cosine_similarity() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-12);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_keyword_hits_carry_parent_doc_ids() {
        let backend = toy_backend();
        let hits = backend.keyword_search("rust safety", 10).await.unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].doc_id, "d1");
        assert!(hits.iter().all(|hit| !hit.doc_id.contains("#chunk")));
    }

    #[tokio::test]
    async fn test_vector_search_ranks_by_similarity() {
        let backend = toy_backend();
        let hits = backend.vector_search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].doc_id, "d1");
        assert_eq!(hits[0].score, 1.0);
    }

    #[tokio::test]
    async fn test_vector_search_without_embeddings_fails() {
        let backend = LocalBackend::from_corpus(vec![Document {
            id: "d1".to_string(),
            title: String::new(),
            text: "some text".to_string(),
        }]);
        let result = backend.vector_search(&[1.0], 5).await;
        assert!(matches!(result, Err(Error::Backend(_))));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_fails() {
        let backend = toy_backend();
        let result = backend.vector_search(&[1.0, 0.0, 0.0], 5).await;
        assert!(matches!(result, Err(Error::Backend(_))));
    }
}
