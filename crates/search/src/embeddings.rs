//! Loaders for precomputed embedding files.

use ragbench_core::io::JsonlReader;
use ragbench_core::{ChunkRecord, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Load chunk records (text plus embedding) from JSONL.
pub fn load_chunks(path: &Path) -> Result<Vec<ChunkRecord>> {
    JsonlReader::read_all(path)
}

/// One row of a query-embedding file. Shares the chunk schema; `doc_id`
/// holds the query id and the remaining chunk fields are ignored.
#[derive(Deserialize)]
struct EmbeddingRecord {
    doc_id: String,
    embedding: Vec<f32>,
}

/// Load query embeddings keyed by query id.
pub fn load_query_embeddings(path: &Path) -> Result<HashMap<String, Vec<f32>>> {
    let records: Vec<EmbeddingRecord> = JsonlReader::read_all(path)?;
    Ok(records
        .into_iter()
        .map(|record| (record.doc_id, record.embedding))
        .collect())
}
