//! Reciprocal Rank Fusion for merging two independently ranked lists.
//!
//! Only rank positions matter; raw scores are discarded. This makes the
//! fusion scale-free, which is why it is used to combine keyword and vector
//! rankings whose raw scores are not comparable.
//!
//! Reference: https://plg.uwaterloo.ca/~gvcormac/cormacksigir09-rrf.pdf

use ragbench_core::ScoredDoc;
use std::collections::HashMap;

/// Default RRF constant.
pub const DEFAULT_RRF_K: usize = 60;

/// Fuse two score-sorted rankings into one.
///
/// Each document accumulates `1/(k + rank)` from every list it appears in
/// (rank is 1-based; absence contributes 0). Output is sorted by fused score
/// descending; equal scores keep first-appearance order across the two lists.
pub fn rrf_fusion(a: &[ScoredDoc], b: &[ScoredDoc], k: usize) -> Vec<ScoredDoc> {
    let mut order: Vec<&str> = Vec::new();
    let mut scores: HashMap<&str, f64> = HashMap::new();

    for list in [a, b] {
        for (rank, hit) in list.iter().enumerate() {
            let contribution = 1.0 / ((k + rank + 1) as f64);
            match scores.get_mut(hit.doc_id.as_str()) {
                Some(score) => *score += contribution,
                None => {
                    order.push(hit.doc_id.as_str());
                    scores.insert(hit.doc_id.as_str(), contribution);
                }
            }
        }
    }

    let mut fused: Vec<ScoredDoc> = order
        .into_iter()
        .map(|doc_id| ScoredDoc::new(doc_id, scores[doc_id]))
        .collect();
    fused.sort_by(|x, y| {
        y.score
            .partial_cmp(&x.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    fused
}
