//! Batch search pipeline: retrieve chunks, aggregate to documents, fuse.
//!
//! Chunk retrieval depth is `top_k * retrieval_multiplier` so that document
//! aggregation has enough chunks to work with before the final truncation
//! to `top_k`. A failing query is logged and skipped; one bad query never
//! aborts a run.

use crate::backend::SearchBackend;
use ragbench_core::{Error, Query, Result, ScoredDoc};
use ragbench_retrieval::{aggregate_chunk_scores, rrf_fusion, AggMethod, DEFAULT_RRF_K};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{info, warn};

/// Retrieval method for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMethod {
    Bm25,
    Vector,
    /// BM25 and vector rankings merged with RRF.
    Hybrid,
}

impl FromStr for SearchMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bm25" => Ok(Self::Bm25),
            "vector" => Ok(Self::Vector),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(Error::config(format!("unknown search method: {other}"))),
        }
    }
}

impl std::fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Bm25 => "bm25",
            Self::Vector => "vector",
            Self::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

/// Knobs for a search run.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub method: SearchMethod,
    /// Documents kept per query in the final ranking.
    pub top_k: usize,
    /// Chunk retrieval depth as a multiple of `top_k`.
    pub retrieval_multiplier: usize,
    pub agg_method: AggMethod,
    /// `m` for the top-m aggregation policies.
    pub agg_m: usize,
    /// RRF constant for hybrid fusion.
    pub rrf_k: usize,
    /// Run id written to the TREC output; `local.{method}` when absent.
    pub run_id: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            method: SearchMethod::Bm25,
            top_k: 100,
            retrieval_multiplier: 10,
            agg_method: AggMethod::MaxP,
            agg_m: 3,
            rrf_k: DEFAULT_RRF_K,
            run_id: None,
        }
    }
}

impl SearchOptions {
    pub fn run_id(&self) -> String {
        self.run_id
            .clone()
            .unwrap_or_else(|| format!("local.{}", self.method))
    }
}

/// Run every query against the backend and produce per-query rankings.
///
/// Queries that fail (backend error, or a missing embedding when the method
/// needs one) are skipped with a warning and absent from the output.
pub async fn run_search(
    backend: &dyn SearchBackend,
    queries: &[Query],
    query_embeddings: &HashMap<String, Vec<f32>>,
    opts: &SearchOptions,
) -> Result<Vec<(String, Vec<ScoredDoc>)>> {
    let chunk_limit = opts.top_k * opts.retrieval_multiplier;
    let mut results = Vec::with_capacity(queries.len());
    let mut failed = 0usize;

    for query in queries {
        match search_one(backend, query, query_embeddings, opts, chunk_limit).await {
            Ok(ranked) => results.push((query.id.clone(), ranked)),
            Err(e) => {
                failed += 1;
                warn!(query = %query.id, "query failed, skipping: {e}");
            }
        }
    }

    info!(
        method = %opts.method,
        queries = results.len(),
        failed,
        "search run complete"
    );
    Ok(results)
}

async fn search_one(
    backend: &dyn SearchBackend,
    query: &Query,
    query_embeddings: &HashMap<String, Vec<f32>>,
    opts: &SearchOptions,
    chunk_limit: usize,
) -> Result<Vec<ScoredDoc>> {
    let embedding_for = |query_id: &str| -> Result<&Vec<f32>> {
        query_embeddings
            .get(query_id)
            .ok_or_else(|| Error::input(format!("no embedding for query {query_id}")))
    };

    let mut ranked = match opts.method {
        SearchMethod::Bm25 => {
            let hits = backend.keyword_search(&query.text, chunk_limit).await?;
            aggregate_chunk_scores(&hits, opts.agg_method, opts.agg_m)
        }
        SearchMethod::Vector => {
            let hits = backend
                .vector_search(embedding_for(&query.id)?, chunk_limit)
                .await?;
            aggregate_chunk_scores(&hits, opts.agg_method, opts.agg_m)
        }
        SearchMethod::Hybrid => {
            let keyword = backend.keyword_search(&query.text, chunk_limit).await?;
            let vector = backend
                .vector_search(embedding_for(&query.id)?, chunk_limit)
                .await?;
            let keyword = aggregate_chunk_scores(&keyword, opts.agg_method, opts.agg_m);
            let vector = aggregate_chunk_scores(&vector, opts.agg_method, opts.agg_m);
            rrf_fusion(&keyword, &vector, opts.rrf_k)
        }
    };
    ranked.truncate(opts.top_k);
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    /// Canned backend; queries containing "boom" fail keyword search.
    struct MockBackend {
        keyword: Vec<ScoredDoc>,
        vector: Vec<ScoredDoc>,
    }

    #[async_trait]
    impl SearchBackend for MockBackend {
        async fn keyword_search(&self, query: &str, limit: usize) -> Result<Vec<ScoredDoc>> {
            if query.contains("boom") {
                return Err(Error::backend("keyword index unavailable"));
            }
            Ok(self.keyword.iter().take(limit).cloned().collect())
        }

        async fn vector_search(&self, _embedding: &[f32], limit: usize) -> Result<Vec<ScoredDoc>> {
            Ok(self.vector.iter().take(limit).cloned().collect())
        }
    }

    fn hits(pairs: &[(&str, f64)]) -> Vec<ScoredDoc> {
        pairs
            .iter()
            .map(|(doc_id, score)| ScoredDoc::new(*doc_id, *score))
            .collect()
    }

    fn query(id: &str, text: &str) -> Query {
        Query {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    fn backend() -> MockBackend {
        MockBackend {
            // d1 has two keyword chunks; max_p keeps the best.
            keyword: hits(&[("d1", 3.0), ("d2", 2.0), ("d1", 1.5)]),
            vector: hits(&[("d3", 0.9), ("d1", 0.8)]),
        }
    }

    #[tokio::test]
    async fn test_bm25_run_aggregates_chunks() {
        let results = run_search(
            &backend(),
            &[query("q1", "anything")],
            &HashMap::new(),
            &SearchOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(results.len(), 1);
        let (query_id, ranked) = &results[0];
        assert_eq!(query_id, "q1");
        assert_eq!(*ranked, hits(&[("d1", 3.0), ("d2", 2.0)]));
    }

    #[tokio::test]
    async fn test_hybrid_fuses_both_rankings() {
        let embeddings: HashMap<String, Vec<f32>> =
            [("q1".to_string(), vec![1.0, 0.0])].into_iter().collect();
        let opts = SearchOptions {
            method: SearchMethod::Hybrid,
            ..SearchOptions::default()
        };

        let results = run_search(&backend(), &[query("q1", "anything")], &embeddings, &opts)
            .await
            .unwrap();
        let (_, ranked) = &results[0];

        // d1 is rank 1 in keyword and rank 2 in vector.
        assert_eq!(ranked[0].doc_id, "d1");
        assert!((ranked[0].score - (1.0 / 61.0 + 1.0 / 62.0)).abs() < 1e-12);
        assert_eq!(ranked.len(), 3);
    }

    #[tokio::test]
    async fn test_failing_query_is_skipped_not_fatal() {
        let results = run_search(
            &backend(),
            &[query("q1", "fine"), query("q2", "boom"), query("q3", "fine")],
            &HashMap::new(),
            &SearchOptions::default(),
        )
        .await
        .unwrap();

        let ids: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q3"]);
    }

    #[tokio::test]
    async fn test_missing_embedding_skips_query() {
        let opts = SearchOptions {
            method: SearchMethod::Vector,
            ..SearchOptions::default()
        };
        let results = run_search(&backend(), &[query("q1", "text")], &HashMap::new(), &opts)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_truncation_to_top_k() {
        let opts = SearchOptions {
            top_k: 1,
            ..SearchOptions::default()
        };
        let results = run_search(&backend(), &[query("q1", "text")], &HashMap::new(), &opts)
            .await
            .unwrap();
        assert_eq!(results[0].1.len(), 1);
    }

    #[test]
    fn test_method_parsing_and_run_id() {
        assert_eq!("hybrid".parse::<SearchMethod>().unwrap(), SearchMethod::Hybrid);
        assert!("semantic".parse::<SearchMethod>().is_err());

        let opts = SearchOptions {
            method: SearchMethod::Hybrid,
            ..SearchOptions::default()
        };
        assert_eq!(opts.run_id(), "local.hybrid");
        let named = SearchOptions {
            run_id: Some("custom".to_string()),
            ..SearchOptions::default()
        };
        assert_eq!(named.run_id(), "custom");
    }
}
