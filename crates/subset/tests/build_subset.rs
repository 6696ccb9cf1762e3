//! End-to-end subset construction over real files on disk.

use pretty_assertions::assert_eq;
use ragbench_core::Error;
use ragbench_subset::{build_subset, write_subset, DatasetPaths, SubsetOptions};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

fn write_dataset(dir: &Path, name: &str, n_docs: usize, n_queries: usize) -> DatasetPaths {
    let corpus = dir.join(format!("{name}_corpus.jsonl"));
    let queries = dir.join(format!("{name}_queries.jsonl"));
    let qrels = dir.join(format!("{name}_qrels.tsv"));

    let mut corpus_lines = String::new();
    for i in 0..n_docs {
        corpus_lines.push_str(&format!(
            "{{\"_id\":\"d{i}\",\"title\":\"doc {i}\",\"text\":\"topic{} filler words\"}}\n",
            i % n_queries.max(1)
        ));
    }
    fs::write(&corpus, corpus_lines).unwrap();

    let mut query_lines = String::new();
    let mut qrels_lines = String::from("query-id\tcorpus-id\tscore\n");
    for i in 0..n_queries {
        query_lines.push_str(&format!("{{\"_id\":\"q{i}\",\"text\":\"topic{i} words\"}}\n"));
        // Each query's relevant doc is the one sharing its topic token.
        qrels_lines.push_str(&format!("q{i}\td{i}\t1\n"));
    }
    fs::write(&queries, query_lines).unwrap();
    fs::write(&qrels, qrels_lines).unwrap();

    DatasetPaths::new(corpus, queries, qrels)
}

fn options(n_queries: usize) -> SubsetOptions {
    SubsetOptions {
        n_queries,
        bm25_top_m: 5,
        max_docs_per_dataset: None,
        seed: 42,
        query_ratio: None,
    }
}

#[test]
fn test_pool_contains_every_relevant_doc_of_sampled_queries() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path(), "toy", 20, 10);

    let subset = build_subset(&[dataset], &options(4)).unwrap();
    assert_eq!(subset.queries.len(), 4);

    let corpus_ids: HashSet<&str> = subset.corpus.iter().map(|doc| doc.id.as_str()).collect();
    for (query_id, doc_id, score) in &subset.qrels {
        assert!(*score > 0.0);
        assert!(
            corpus_ids.contains(doc_id.as_str()),
            "relevant doc {doc_id} of {query_id} missing from subset corpus"
        );
    }
    // Every sampled query keeps its judgment.
    let judged: HashSet<&str> = subset.qrels.iter().map(|(q, _, _)| q.as_str()).collect();
    for query in &subset.queries {
        assert!(judged.contains(query.id.as_str()));
    }
}

#[test]
fn test_identical_inputs_produce_byte_identical_output() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path(), "toy", 30, 12);

    let first = build_subset(&[dataset.clone()], &options(5)).unwrap();
    let second = build_subset(&[dataset], &options(5)).unwrap();

    let out_a = dir.path().join("out_a");
    let out_b = dir.path().join("out_b");
    write_subset(&first, &out_a).unwrap();
    write_subset(&second, &out_b).unwrap();

    for file in ["corpus.jsonl", "queries.jsonl", "qrels.tsv"] {
        let a = fs::read(out_a.join(file)).unwrap();
        let b = fs::read(out_b.join(file)).unwrap();
        assert_eq!(a, b, "{file} differs between identical runs");
    }
}

#[test]
fn test_multi_dataset_ids_are_prefixed_and_ratio_allocated() {
    let dir = tempfile::tempdir().unwrap();
    let alpha = write_dataset(dir.path(), "alpha", 20, 10);
    let beta = write_dataset(dir.path(), "beta", 20, 10);

    let mut opts = options(10);
    opts.query_ratio = Some(vec![3, 1]);
    let subset = build_subset(&[alpha, beta], &opts).unwrap();

    // floor(10 * 3/4) = 7 for alpha, beta absorbs the remaining 3.
    let alpha_queries = subset
        .queries
        .iter()
        .filter(|q| q.id.starts_with("alpha#"))
        .count();
    let beta_queries = subset
        .queries
        .iter()
        .filter(|q| q.id.starts_with("beta#"))
        .count();
    assert_eq!((alpha_queries, beta_queries), (7, 3));

    for doc in &subset.corpus {
        assert!(
            doc.id.starts_with("alpha#") || doc.id.starts_with("beta#"),
            "unprefixed doc id {} in merged subset",
            doc.id
        );
    }
    for (query_id, doc_id, _) in &subset.qrels {
        let stratum = query_id.split('#').next().unwrap();
        assert!(doc_id.starts_with(stratum), "qrels must stay within a dataset");
    }
}

#[test]
fn test_single_dataset_ids_are_not_prefixed() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path(), "solo", 10, 5);

    let subset = build_subset(&[dataset], &options(3)).unwrap();
    assert!(subset.corpus.iter().all(|doc| !doc.id.contains('#')));
    assert!(subset.queries.iter().all(|q| !q.id.contains('#')));
}

#[test]
fn test_document_cap_never_drops_relevant_docs() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path(), "capped", 50, 10);

    let mut opts = options(10);
    opts.max_docs_per_dataset = Some(3);
    let subset = build_subset(&[dataset], &opts).unwrap();

    let corpus_ids: HashSet<&str> = subset.corpus.iter().map(|doc| doc.id.as_str()).collect();
    for (_, doc_id, _) in &subset.qrels {
        assert!(corpus_ids.contains(doc_id.as_str()));
    }
}

#[test]
fn test_qrels_output_is_sorted_by_query_then_doc() {
    let dir = tempfile::tempdir().unwrap();
    let alpha = write_dataset(dir.path(), "alpha", 20, 10);
    let beta = write_dataset(dir.path(), "beta", 20, 10);

    let subset = build_subset(&[alpha, beta], &options(8)).unwrap();
    assert!(!subset.qrels.is_empty());
    for pair in subset.qrels.windows(2) {
        let (q_a, d_a, _) = &pair[0];
        let (q_b, d_b, _) = &pair[1];
        assert!((q_a, d_a) <= (q_b, d_b), "qrels rows out of order");
    }
}

#[test]
fn test_all_malformed_corpus_aborts_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path(), "toy", 10, 5);
    fs::write(&dataset.corpus, "garbage\nmore garbage\n").unwrap();

    let result = build_subset(&[dataset], &options(3));
    assert!(matches!(result, Err(Error::Parse { .. })));
}

#[test]
fn test_missing_corpus_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut dataset = write_dataset(dir.path(), "toy", 5, 3);
    dataset.corpus = dir.path().join("nope_corpus.jsonl");

    let result = build_subset(&[dataset], &options(2));
    assert!(matches!(result, Err(Error::Input(_))));
}

#[test]
fn test_malformed_qrels_lines_are_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path(), "toy", 10, 5);
    let mut qrels = fs::read_to_string(&dataset.qrels).unwrap();
    qrels.push_str("broken line without tabs\n");
    fs::write(&dataset.qrels, qrels).unwrap();

    let subset = build_subset(&[dataset], &options(3)).unwrap();
    assert_eq!(subset.queries.len(), 3);
}

#[test]
fn test_ratio_length_must_match_datasets() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path(), "toy", 10, 5);

    let mut opts = options(3);
    opts.query_ratio = Some(vec![3, 1]);
    let result = build_subset(&[dataset], &opts);
    assert!(matches!(result, Err(Error::Config(_))));
}
