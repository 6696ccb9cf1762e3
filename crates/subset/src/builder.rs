//! Candidate-pool subset construction.
//!
//! For each dataset the builder samples judged queries, then pools every
//! positively-judged document together with the BM25 top-M for each sampled
//! query. The pool keeps hard negatives (lexically similar but irrelevant
//! documents) so downstream retrieval quality is measured against plausible
//! distractors, not random ones.

use crate::dataset::{load_corpus, DatasetPaths};
use crate::sample::{allocate_by_ratio, sample_queries};
use ragbench_core::io::{read_qrels, write_jsonl, write_qrels, JsonlReader};
use ragbench_core::{Document, Error, Query, Result};
use ragbench_retrieval::{Bm25Index, Tokenizer};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;

/// Knobs for subset construction.
#[derive(Debug, Clone)]
pub struct SubsetOptions {
    /// Total number of queries to sample across all datasets.
    pub n_queries: usize,
    /// Per-query BM25 pool depth.
    pub bm25_top_m: usize,
    /// Cap on non-required documents loaded per dataset.
    pub max_docs_per_dataset: Option<usize>,
    /// Base random seed; dataset `i` samples with `seed + i`.
    pub seed: u64,
    /// Optional per-dataset query allocation weights (same length as the
    /// dataset list). Equal weights when absent.
    pub query_ratio: Option<Vec<u64>>,
}

impl Default for SubsetOptions {
    fn default() -> Self {
        Self {
            n_queries: 200,
            bm25_top_m: 200,
            max_docs_per_dataset: Some(100_000),
            seed: 42,
            query_ratio: None,
        }
    }
}

/// A built subset, sorted and ready to write.
#[derive(Debug, Clone)]
pub struct Subset {
    pub corpus: Vec<Document>,
    pub queries: Vec<Query>,
    /// (query_id, doc_id, score) positive judgments restricted to the pool.
    pub qrels: Vec<(String, String, f64)>,
}

/// Build a candidate-pool subset from one or more datasets.
///
/// With two or more datasets every document and query id is prefixed with
/// `{dataset}#` before merging, so ids stay unambiguous. All sampling is
/// seeded; identical inputs and options produce an identical subset.
pub fn build_subset(datasets: &[DatasetPaths], options: &SubsetOptions) -> Result<Subset> {
    if datasets.is_empty() {
        return Err(Error::config("at least one dataset is required"));
    }
    let weights = match &options.query_ratio {
        Some(weights) => {
            if weights.len() != datasets.len() {
                return Err(Error::config(format!(
                    "query ratio has {} weights for {} datasets",
                    weights.len(),
                    datasets.len()
                )));
            }
            weights.clone()
        }
        None => vec![1; datasets.len()],
    };
    let allocation = allocate_by_ratio(options.n_queries, &weights)?;
    let multi = datasets.len() >= 2;

    let mut subset = Subset {
        corpus: Vec::new(),
        queries: Vec::new(),
        qrels: Vec::new(),
    };

    for (i, (dataset, &target)) in datasets.iter().zip(&allocation).enumerate() {
        info!(
            dataset = %dataset.name,
            target_queries = target,
            "building dataset stratum"
        );

        let qrels = read_qrels(&dataset.qrels)?;
        let required = qrels.all_positive_docs();
        let corpus = load_corpus(&dataset.corpus, options.max_docs_per_dataset, &required)?;
        let queries: Vec<Query> = JsonlReader::read_all(&dataset.queries)?;

        let sampled = sample_queries(&queries, &qrels, target, options.seed + i as u64);
        info!(
            dataset = %dataset.name,
            sampled = sampled.len(),
            corpus = corpus.len(),
            "sampled queries"
        );

        let index = Bm25Index::build(
            corpus
                .iter()
                .map(|doc| (doc.id.clone(), doc.full_text())),
            Tokenizer::whitespace(),
        );

        let mut pool: HashSet<String> = HashSet::new();
        for query in &sampled {
            for doc_id in qrels.positive_docs(&query.id) {
                pool.insert(doc_id.to_string());
            }
            for hit in index.top(&query.text, options.bm25_top_m) {
                pool.insert(hit.doc_id);
            }
        }
        info!(dataset = %dataset.name, pool = pool.len(), "candidate pool built");

        let prefix = |id: &str| -> String {
            if multi {
                format!("{}#{}", dataset.name, id)
            } else {
                id.to_string()
            }
        };

        subset.corpus.extend(
            corpus
                .into_iter()
                .filter(|doc| pool.contains(&doc.id))
                .map(|doc| Document {
                    id: prefix(&doc.id),
                    ..doc
                }),
        );
        for query in sampled {
            let query_id = prefix(&query.id);
            for doc_id in qrels.positive_docs(&query.id) {
                if pool.contains(doc_id) {
                    subset.qrels.push((
                        query_id.clone(),
                        prefix(doc_id),
                        qrels.relevance(&query.id, doc_id),
                    ));
                }
            }
            subset.queries.push(Query {
                id: query_id,
                text: query.text,
            });
        }
    }

    subset.corpus.sort_by(|a, b| a.id.cmp(&b.id));
    subset.queries.sort_by(|a, b| a.id.cmp(&b.id));
    subset
        .qrels
        .sort_by(|(q_a, d_a, s_a), (q_b, d_b, s_b)| {
            (q_a, d_a).cmp(&(q_b, d_b)).then(s_a.total_cmp(s_b))
        });

    info!(
        corpus = subset.corpus.len(),
        queries = subset.queries.len(),
        qrels = subset.qrels.len(),
        "subset built"
    );
    Ok(subset)
}

/// Write a subset as `corpus.jsonl`, `queries.jsonl` and `qrels.tsv`.
pub fn write_subset(subset: &Subset, out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)?;
    write_jsonl(&out_dir.join("corpus.jsonl"), &subset.corpus)?;
    write_jsonl(&out_dir.join("queries.jsonl"), &subset.queries)?;
    write_qrels(
        &out_dir.join("qrels.tsv"),
        subset
            .qrels
            .iter()
            .map(|(query_id, doc_id, score)| (query_id.as_str(), doc_id.as_str(), *score)),
    )?;
    Ok(())
}
