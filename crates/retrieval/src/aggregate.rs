//! Chunk-level to document-level score aggregation.
//!
//! Search backends return chunk hits; documents are ranked by collapsing
//! each document's chunk scores with one of four interchangeable policies.

use ragbench_core::{Error, Result, ScoredDoc};
use std::collections::HashMap;
use std::str::FromStr;

/// RRF constant used by the per-document chunk-rank policy.
const RRF_PER_DOC_K: f64 = 60.0;

/// Aggregation policy for collapsing chunk scores into a document score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggMethod {
    /// Document score = max of its chunk scores.
    MaxP,
    /// Sum of the top `m` chunk scores (all of them when fewer than `m`).
    TopMSum,
    /// Mean of the top `m` chunk scores; 0.0 for an empty selection.
    TopMAvg,
    /// RRF over the document's own chunk ranks: Σ 1/(60 + rank). Rewards
    /// documents with many well-ranked chunks regardless of raw scores.
    RrfPerDoc,
}

impl FromStr for AggMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "max_p" => Ok(Self::MaxP),
            "top_m_sum" => Ok(Self::TopMSum),
            "top_m_avg" => Ok(Self::TopMAvg),
            "rrf_per_doc" => Ok(Self::RrfPerDoc),
            other => Err(Error::config(format!(
                "unknown aggregation method: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for AggMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::MaxP => "max_p",
            Self::TopMSum => "top_m_sum",
            Self::TopMAvg => "top_m_avg",
            Self::RrfPerDoc => "rrf_per_doc",
        };
        f.write_str(name)
    }
}

/// Collapse chunk-level hits into a document-level ranking.
///
/// Hits are grouped by parent doc id (chunk ids are resolved to doc ids
/// upstream). Output is sorted by aggregated score descending; equal scores
/// keep the order in which documents first appeared in `chunk_hits`.
pub fn aggregate_chunk_scores(chunk_hits: &[ScoredDoc], method: AggMethod, m: usize) -> Vec<ScoredDoc> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<f64>> = HashMap::new();

    for hit in chunk_hits {
        let scores = groups.entry(hit.doc_id.as_str()).or_insert_with(|| {
            order.push(hit.doc_id.as_str());
            Vec::new()
        });
        scores.push(hit.score);
    }

    let mut ranked: Vec<ScoredDoc> = order
        .into_iter()
        .map(|doc_id| {
            let mut scores = groups.remove(doc_id).unwrap_or_default();
            scores.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

            let score = match method {
                AggMethod::MaxP => scores.first().copied().unwrap_or(0.0),
                AggMethod::TopMSum => scores.iter().take(m).sum(),
                AggMethod::TopMAvg => {
                    let top: Vec<f64> = scores.iter().take(m).copied().collect();
                    if top.is_empty() {
                        0.0
                    } else {
                        top.iter().sum::<f64>() / top.len() as f64
                    }
                }
                AggMethod::RrfPerDoc => (1..=scores.len())
                    .map(|rank| 1.0 / (RRF_PER_DOC_K + rank as f64))
                    .sum(),
            };

            ScoredDoc::new(doc_id, score)
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}
