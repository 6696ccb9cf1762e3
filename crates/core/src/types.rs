//! Data model shared across the benchmarking pipeline.
//!
//! All entities are read from input streams, held in memory for one pipeline
//! invocation, and written to output streams. There is no persistent store:
//! a run is idempotent given identical inputs and random seed.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A corpus document in BEIR-style JSONL format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub text: String,
}

impl Document {
    /// Title and body combined as a single retrieval field.
    pub fn full_text(&self) -> String {
        if self.title.is_empty() {
            self.text.clone()
        } else {
            format!("{} {}", self.title, self.text)
        }
    }
}

/// A benchmark query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    #[serde(rename = "_id")]
    pub id: String,
    pub text: String,
}

/// A chunk of a document with its precomputed embedding.
///
/// Chunk ids are `{doc_id}#chunk{i}` with a 0-based contiguous `chunk_index`;
/// `doc_id` is a non-owning back-reference to the parent document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub doc_id: String,
    pub chunk_index: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A document-level scored hit.
///
/// Score scale is search-method-specific (BM25 unbounded positive, cosine in
/// [-1, 1]); cross-method combination must go through rank fusion, never raw
/// score addition.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDoc {
    pub doc_id: String,
    pub score: f64,
}

impl ScoredDoc {
    pub fn new(doc_id: impl Into<String>, score: f64) -> Self {
        Self {
            doc_id: doc_id.into(),
            score,
        }
    }
}

/// Relevance judgments grouped by query.
///
/// Graded scores are retained for metric computation; a (query, doc) pair is
/// "relevant" only when its score is strictly positive.
#[derive(Debug, Clone, Default)]
pub struct Qrels {
    by_query: HashMap<String, HashMap<String, f64>>,
    skipped_lines: usize,
}

impl Qrels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a judgment. Later judgments for the same pair overwrite.
    pub fn insert(&mut self, query_id: impl Into<String>, doc_id: impl Into<String>, score: f64) {
        self.by_query
            .entry(query_id.into())
            .or_default()
            .insert(doc_id.into(), score);
    }

    /// Number of queries with at least one judgment (of any grade).
    pub fn num_queries(&self) -> usize {
        self.by_query.len()
    }

    /// Graded relevance of a (query, doc) pair; 0.0 when unjudged.
    pub fn relevance(&self, query_id: &str, doc_id: &str) -> f64 {
        self.by_query
            .get(query_id)
            .and_then(|docs| docs.get(doc_id))
            .copied()
            .unwrap_or(0.0)
    }

    /// Doc ids judged relevant (score > 0) for a query.
    pub fn positive_docs(&self, query_id: &str) -> HashSet<&str> {
        self.by_query
            .get(query_id)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, &score)| score > 0.0)
                    .map(|(doc_id, _)| doc_id.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the query has at least one positive judgment.
    pub fn has_positive(&self, query_id: &str) -> bool {
        self.by_query
            .get(query_id)
            .is_some_and(|docs| docs.values().any(|&score| score > 0.0))
    }

    /// Union of all positively-judged doc ids across every query.
    ///
    /// This is the "required set" for corpus loading: these documents must be
    /// retained regardless of any per-dataset document cap.
    pub fn all_positive_docs(&self) -> HashSet<String> {
        self.by_query
            .values()
            .flat_map(|docs| {
                docs.iter()
                    .filter(|(_, &score)| score > 0.0)
                    .map(|(doc_id, _)| doc_id.clone())
            })
            .collect()
    }

    /// Iterate over (query_id, doc_id, score) judgments in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.by_query.iter().flat_map(|(query_id, docs)| {
            docs.iter()
                .map(move |(doc_id, &score)| (query_id.as_str(), doc_id.as_str(), score))
        })
    }

    /// Number of malformed lines skipped while reading.
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    pub(crate) fn record_skipped(&mut self) {
        self.skipped_lines += 1;
    }

    /// Total number of stored judgments.
    pub fn len(&self) -> usize {
        self.by_query.values().map(|docs| docs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_query.is_empty()
    }
}
