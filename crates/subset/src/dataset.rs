//! Per-dataset input handling for the subset builder.

use indicatif::{ProgressBar, ProgressStyle};
use ragbench_core::io::{count_lines, JsonlReader};
use ragbench_core::{Document, Error, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// The three input files of one BEIR-style dataset.
#[derive(Debug, Clone)]
pub struct DatasetPaths {
    /// Display name, used as the id prefix in multi-dataset subsets.
    pub name: String,
    pub corpus: PathBuf,
    pub queries: PathBuf,
    pub qrels: PathBuf,
}

impl DatasetPaths {
    /// Build from the three file paths, deriving the name from the corpus
    /// file stem (a trailing `_corpus` is stripped, so `fiqa_corpus.jsonl`
    /// names the dataset `fiqa`).
    pub fn new(
        corpus: impl Into<PathBuf>,
        queries: impl Into<PathBuf>,
        qrels: impl Into<PathBuf>,
    ) -> Self {
        let corpus = corpus.into();
        let name = dataset_name(&corpus);
        Self {
            name,
            corpus,
            queries: queries.into(),
            qrels: qrels.into(),
        }
    }
}

/// Dataset name derived from a corpus file path.
pub fn dataset_name(corpus: &Path) -> String {
    let stem = corpus
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("dataset");
    stem.strip_suffix("_corpus").unwrap_or(stem).to_string()
}

/// Load a corpus with an optional document cap.
///
/// Documents in `required` are always kept and never count against the cap;
/// once the cap is full, scanning continues to the end of the file so that
/// required documents appearing late are still picked up. Required ids that
/// never appear are logged and left out. Malformed lines are skipped with a
/// count; the load fails only when no valid document remains.
pub fn load_corpus(
    path: &Path,
    max_docs: Option<usize>,
    required: &HashSet<String>,
) -> Result<Vec<Document>> {
    let total = count_lines(path)?;
    let bar = create_progress_bar(total);
    bar.set_message(format!("loading {}", path.display()));

    let mut reader: JsonlReader<Document> = JsonlReader::open(path)?;
    let mut docs = Vec::new();
    let mut capped = 0usize;
    let mut missing: HashSet<&String> = required.iter().collect();

    while let Some(doc) = reader.next_record()? {
        bar.inc(1);
        if required.contains(&doc.id) {
            missing.remove(&doc.id);
            docs.push(doc);
            continue;
        }
        if max_docs.is_none_or(|cap| capped < cap) {
            capped += 1;
            docs.push(doc);
        } else if missing.is_empty() {
            // Cap reached and every required doc found; nothing left to scan for.
            break;
        }
    }
    bar.finish_and_clear();

    if docs.is_empty() && reader.skipped() > 0 {
        return Err(Error::parse(
            path.display().to_string(),
            total,
            format!("no valid documents ({} lines skipped)", reader.skipped()),
        ));
    }
    if !missing.is_empty() {
        warn!(
            file = %path.display(),
            missing = missing.len(),
            "relevant documents referenced by qrels were not found in the corpus"
        );
    }
    if reader.skipped() > 0 {
        warn!(
            file = %path.display(),
            skipped = reader.skipped(),
            "skipped malformed corpus lines"
        );
    }
    info!(
        file = %path.display(),
        docs = docs.len(),
        "corpus loaded"
    );
    Ok(docs)
}

/// Create a progress bar for corpus loading.
fn create_progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .map_err(|e| error!("Failed to set progress bar style: {}", e))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    bar
}
