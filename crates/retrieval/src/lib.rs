//! Pure retrieval primitives for the ragbench pipeline
//!
//! - **Tokenizer**: whitespace default with pluggable segmentation and a
//!   character-bigram fallback
//! - **BM25**: inverted index scoring every document in a fixed collection
//! - **Aggregation**: chunk-level to document-level score collapsing
//! - **Fusion**: Reciprocal Rank Fusion of two rankings
//!
//! Everything here is deterministic and side-effect free; failures on
//! well-typed input are limited to configuration parsing.

pub mod aggregate;
pub mod bm25;
pub mod fusion;
pub mod tokenizer;

pub use aggregate::{aggregate_chunk_scores, AggMethod};
pub use bm25::{Bm25Index, DEFAULT_B, DEFAULT_K1};
pub use fusion::{rrf_fusion, DEFAULT_RRF_K};
pub use tokenizer::{SegmentMode, Segmenter, Tokenizer};
