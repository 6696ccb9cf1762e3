//! Candidate-pool subset builder.
//!
//! Carves a small, self-consistent benchmark out of one or more BEIR-style
//! datasets: seeded query sampling, BM25 candidate pooling per query, and
//! deterministic merged output.

pub mod builder;
pub mod dataset;
pub mod sample;

pub use builder::{build_subset, write_subset, Subset, SubsetOptions};
pub use dataset::{dataset_name, DatasetPaths};
pub use sample::{allocate_by_ratio, parse_ratio, sample_queries};
