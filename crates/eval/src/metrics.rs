//! Standard rank-based retrieval metrics.
//!
//! All per-query metrics take the full ranked list for a query plus the
//! relevance judgments. Binary metrics (recall, MRR, MAP) treat a document
//! as relevant when its judged score is strictly positive; nDCG uses the
//! graded score as linear gain.

use ragbench_core::{Qrels, ScoredDoc};
use std::collections::BTreeMap;
use std::collections::HashMap;
use tracing::info;

/// Metric names in report order.
pub const METRIC_NAMES: [&str; 5] = ["nDCG@10", "Recall@10", "Recall@100", "MRR@10", "MAP"];

/// Normalized discounted cumulative gain at `k` with linear gain.
pub fn ndcg_at_k(ranked: &[ScoredDoc], qrels: &Qrels, query_id: &str, k: usize) -> f64 {
    let dcg: f64 = ranked
        .iter()
        .take(k)
        .enumerate()
        .map(|(i, hit)| qrels.relevance(query_id, &hit.doc_id) / ((i + 2) as f64).log2())
        .sum();

    let mut ideal: Vec<f64> = qrels
        .positive_docs(query_id)
        .iter()
        .map(|doc_id| qrels.relevance(query_id, doc_id))
        .collect();
    ideal.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let idcg: f64 = ideal
        .iter()
        .take(k)
        .enumerate()
        .map(|(i, gain)| gain / ((i + 2) as f64).log2())
        .sum();

    if idcg == 0.0 {
        0.0
    } else {
        dcg / idcg
    }
}

/// Fraction of relevant documents found in the top `k`.
pub fn recall_at_k(ranked: &[ScoredDoc], qrels: &Qrels, query_id: &str, k: usize) -> f64 {
    let positives = qrels.positive_docs(query_id);
    if positives.is_empty() {
        return 0.0;
    }
    let found = ranked
        .iter()
        .take(k)
        .filter(|hit| positives.contains(hit.doc_id.as_str()))
        .count();
    found as f64 / positives.len() as f64
}

/// Reciprocal rank of the first relevant document within the top `k`.
pub fn mrr_at_k(ranked: &[ScoredDoc], qrels: &Qrels, query_id: &str, k: usize) -> f64 {
    let positives = qrels.positive_docs(query_id);
    ranked
        .iter()
        .take(k)
        .position(|hit| positives.contains(hit.doc_id.as_str()))
        .map(|i| 1.0 / (i + 1) as f64)
        .unwrap_or(0.0)
}

/// Average precision over the full ranking.
pub fn average_precision(ranked: &[ScoredDoc], qrels: &Qrels, query_id: &str) -> f64 {
    let positives = qrels.positive_docs(query_id);
    if positives.is_empty() {
        return 0.0;
    }

    let mut found = 0usize;
    let mut precision_sum = 0.0;
    for (i, hit) in ranked.iter().enumerate() {
        if positives.contains(hit.doc_id.as_str()) {
            found += 1;
            precision_sum += found as f64 / (i + 1) as f64;
        }
    }
    precision_sum / positives.len() as f64
}

/// Metric means over all evaluated queries.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    /// Metric name to mean value, keyed by [`METRIC_NAMES`] entries.
    pub metrics: BTreeMap<String, f64>,
    /// Number of queries the means cover.
    pub num_queries: usize,
}

/// Evaluate a run against judgments.
///
/// The mean is taken over every judged query with at least one positive
/// document; a judged query missing from the run scores zero on every
/// metric rather than being dropped.
pub fn evaluate_run(run: &HashMap<String, Vec<ScoredDoc>>, qrels: &Qrels) -> EvalResult {
    let empty: Vec<ScoredDoc> = Vec::new();
    let mut sums = [0.0f64; METRIC_NAMES.len()];
    let mut num_queries = 0usize;

    let mut query_ids: Vec<&str> = Vec::new();
    for (query_id, _, _) in qrels.iter() {
        query_ids.push(query_id);
    }
    query_ids.sort_unstable();
    query_ids.dedup();

    for query_id in query_ids {
        if !qrels.has_positive(query_id) {
            continue;
        }
        num_queries += 1;
        let ranked = run.get(query_id).unwrap_or(&empty);

        sums[0] += ndcg_at_k(ranked, qrels, query_id, 10);
        sums[1] += recall_at_k(ranked, qrels, query_id, 10);
        sums[2] += recall_at_k(ranked, qrels, query_id, 100);
        sums[3] += mrr_at_k(ranked, qrels, query_id, 10);
        sums[4] += average_precision(ranked, qrels, query_id);
    }

    if num_queries > 0 {
        for value in &mut sums {
            *value /= num_queries as f64;
        }
    }
    info!(queries = num_queries, "evaluated run");
    EvalResult {
        metrics: METRIC_NAMES
            .iter()
            .zip(sums)
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
        num_queries,
    }
}
