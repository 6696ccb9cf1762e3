//! Core types and I/O for the ragbench retrieval evaluation pipeline
//!
//! This crate provides the foundations shared by the benchmarking tools:
//!
//! - **Data model**: documents, queries, qrels, chunks, scored hits
//! - **I/O**: streaming JSONL/TSV readers, TREC run read/write
//! - **Error handling**: unified error type with the pipeline's failure
//!   taxonomy (fatal configuration, fatal input, recoverable parse,
//!   per-query backend)

pub mod error;
pub mod io;
pub mod types;

pub use error::{Error, Result};
pub use types::{ChunkRecord, Document, Qrels, Query, ScoredDoc};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
