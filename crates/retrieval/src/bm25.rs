//! In-memory BM25 inverted index over a fixed document collection.
//!
//! Built once per corpus; scoring covers every indexed document so callers
//! can slice an exact top-M. For a fixed corpus and tokenizer, scores are
//! exactly reproducible; score ties are broken by document insertion order,
//! which makes top-M truncation deterministic.

use crate::tokenizer::Tokenizer;
use ragbench_core::ScoredDoc;
use std::collections::HashMap;

/// Default BM25 term-frequency saturation constant.
pub const DEFAULT_K1: f64 = 1.5;
/// Default BM25 length-normalization constant.
pub const DEFAULT_B: f64 = 0.75;

/// A single entry in a term's postings list.
#[derive(Debug, Clone)]
struct Posting {
    /// Index into `doc_ids` (document insertion order).
    doc: u32,
    /// Number of times the term appears in this document.
    term_frequency: u32,
}

/// Inverted index with per-document lengths for BM25 scoring.
pub struct Bm25Index {
    postings: HashMap<String, Vec<Posting>>,
    doc_ids: Vec<String>,
    doc_lengths: Vec<u32>,
    total_doc_length: u64,
    tokenizer: Tokenizer,
    k1: f64,
    b: f64,
}

impl Bm25Index {
    /// Build an index over `(doc_id, text)` pairs with default parameters.
    ///
    /// Documents are scored in the order they are supplied; that order is
    /// the tie-break for equal scores.
    pub fn build<I>(docs: I, tokenizer: Tokenizer) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self::build_with_params(docs, tokenizer, DEFAULT_K1, DEFAULT_B)
    }

    /// Build an index with explicit `k1` and `b`.
    pub fn build_with_params<I>(docs: I, tokenizer: Tokenizer, k1: f64, b: f64) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut index = Self {
            postings: HashMap::new(),
            doc_ids: Vec::new(),
            doc_lengths: Vec::new(),
            total_doc_length: 0,
            tokenizer,
            k1,
            b,
        };

        for (doc_id, text) in docs {
            index.add_document(doc_id, &text);
        }
        index
    }

    fn add_document(&mut self, doc_id: String, text: &str) {
        let tokens = self.tokenizer.tokenize(text);
        let doc = self.doc_ids.len() as u32;
        let doc_len = tokens.len() as u32;

        self.doc_ids.push(doc_id);
        self.doc_lengths.push(doc_len);
        self.total_doc_length += doc_len as u64;

        let mut tf_map: HashMap<String, u32> = HashMap::new();
        for token in tokens {
            *tf_map.entry(token).or_insert(0) += 1;
        }

        for (term, term_frequency) in tf_map {
            self.postings.entry(term).or_default().push(Posting {
                doc,
                term_frequency,
            });
        }
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }

    /// Average document length across the collection.
    pub fn average_doc_length(&self) -> f64 {
        if self.doc_ids.is_empty() {
            return 0.0;
        }
        self.total_doc_length as f64 / self.doc_ids.len() as f64
    }

    /// Score a query against every indexed document.
    ///
    /// Returns all documents (including zero-scored ones) sorted by
    /// descending score, ties in insertion order; callers slice top-M.
    pub fn score_all(&self, query: &str) -> Vec<ScoredDoc> {
        let n = self.doc_ids.len();
        let mut scores = vec![0.0f64; n];

        if n > 0 {
            let avgdl = self.average_doc_length();
            let corpus_size = n as f64;

            for token in self.tokenizer.tokenize(query) {
                let Some(postings) = self.postings.get(&token) else {
                    continue;
                };
                let df = postings.len() as f64;
                let idf = ((corpus_size - df + 0.5) / (df + 0.5) + 1.0).ln();

                for posting in postings {
                    let dl = self.doc_lengths[posting.doc as usize] as f64;
                    let tf = posting.term_frequency as f64;
                    let tf_norm = (tf * (self.k1 + 1.0))
                        / (tf + self.k1 * (1.0 - self.b + self.b * dl / avgdl));
                    scores[posting.doc as usize] += idf * tf_norm;
                }
            }
        }

        let mut ranked: Vec<ScoredDoc> = self
            .doc_ids
            .iter()
            .zip(&scores)
            .map(|(doc_id, &score)| ScoredDoc::new(doc_id.clone(), score))
            .collect();
        // Stable sort: equal scores keep document insertion order.
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    /// Top-M documents for a query.
    pub fn top(&self, query: &str, m: usize) -> Vec<ScoredDoc> {
        let mut ranked = self.score_all(query);
        ranked.truncate(m);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn toy_index() -> Bm25Index {
        let docs = vec![
            ("A".to_string(), "cat dog".to_string()),
            ("B".to_string(), "dog bird".to_string()),
            ("C".to_string(), "cat cat cat".to_string()),
        ];
        Bm25Index::build(docs, Tokenizer::whitespace())
    }

    #[test]
    fn test_top_2_for_cat_is_a_and_c() {
        let index = toy_index();
        let top = index.top("cat", 2);
        let ids: Vec<&str> = top.iter().map(|hit| hit.doc_id.as_str()).collect();
        assert!(ids.contains(&"A"));
        assert!(ids.contains(&"C"));
        assert!(!ids.contains(&"B"), "B has no 'cat' occurrence");
    }

    #[test]
    fn test_score_all_covers_every_document() {
        let index = toy_index();
        let ranked = index.score_all("cat");
        assert_eq!(ranked.len(), 3);
        // B scores zero but is still present, last.
        assert_eq!(ranked[2].doc_id, "B");
        assert_eq!(ranked[2].score, 0.0);
    }

    #[test]
    fn test_scores_are_deterministic() {
        let first = toy_index().score_all("cat dog");
        let second = toy_index().score_all("cat dog");
        assert_eq!(first, second);
    }

    #[test]
    fn test_ties_break_by_insertion_order() {
        let docs = vec![
            ("d1".to_string(), "alpha beta".to_string()),
            ("d2".to_string(), "alpha beta".to_string()),
            ("d3".to_string(), "alpha beta".to_string()),
        ];
        let index = Bm25Index::build(docs, Tokenizer::whitespace());
        let ranked = index.score_all("alpha");
        let ids: Vec<&str> = ranked.iter().map(|hit| hit.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "d2", "d3"]);
    }

    #[test]
    fn test_empty_query_yields_zero_scores() {
        let index = toy_index();
        let ranked = index.score_all("");
        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|hit| hit.score == 0.0));
    }

    #[test]
    fn test_empty_index() {
        let index = Bm25Index::build(Vec::new(), Tokenizer::whitespace());
        assert!(index.is_empty());
        assert!(index.score_all("cat").is_empty());
        assert_eq!(index.average_doc_length(), 0.0);
    }

    #[test]
    fn test_term_frequency_raises_score() {
        let index = toy_index();
        let ranked = index.score_all("cat");
        let score_of = |id: &str| {
            ranked
                .iter()
                .find(|hit| hit.doc_id == id)
                .map(|hit| hit.score)
                .unwrap_or(0.0)
        };
        assert!(
            score_of("C") > score_of("A"),
            "three occurrences of 'cat' should outscore one"
        );
    }
}
