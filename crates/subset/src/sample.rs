//! Seeded query sampling and ratio allocation across datasets.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use ragbench_core::{Error, Qrels, Query, Result};

/// Parse a colon-separated ratio string such as `3:1`.
pub fn parse_ratio(s: &str) -> Result<Vec<u64>> {
    let weights: Vec<u64> = s
        .split(':')
        .map(|part| part.trim().parse::<u64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| Error::config(format!("invalid query ratio '{s}', expected e.g. 3:1")))?;
    if weights.is_empty() || weights.iter().all(|&w| w == 0) {
        return Err(Error::config(format!(
            "invalid query ratio '{s}', weights must not all be zero"
        )));
    }
    Ok(weights)
}

/// Split `n` queries across datasets proportionally to `weights`.
///
/// Each dataset gets `floor(n * w_i / total)`; the last dataset absorbs the
/// rounding remainder so the allocations always sum to `n`.
pub fn allocate_by_ratio(n: usize, weights: &[u64]) -> Result<Vec<usize>> {
    if weights.is_empty() {
        return Err(Error::config("query ratio has no weights"));
    }
    let total: u64 = weights.iter().sum();
    if total == 0 {
        return Err(Error::config("query ratio weights sum to zero"));
    }

    let mut allocation = Vec::with_capacity(weights.len());
    let mut assigned = 0usize;
    for (i, &weight) in weights.iter().enumerate() {
        let share = if i + 1 == weights.len() {
            n - assigned
        } else {
            (n as u64 * weight / total) as usize
        };
        assigned += share;
        allocation.push(share);
    }
    Ok(allocation)
}

/// Sample up to `n` queries that have at least one positive judgment.
///
/// When fewer than `n` qualify, all of them are returned in file order.
/// Otherwise a seeded `StdRng` draw makes the choice reproducible; callers
/// vary the seed per dataset so strata are sampled independently.
pub fn sample_queries(queries: &[Query], qrels: &Qrels, n: usize, seed: u64) -> Vec<Query> {
    let valid: Vec<&Query> = queries
        .iter()
        .filter(|query| qrels.has_positive(&query.id))
        .collect();

    if valid.len() <= n {
        return valid.into_iter().cloned().collect();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    valid
        .choose_multiple(&mut rng, n)
        .map(|query| (*query).clone())
        .collect()
}
