//! Search execution: backend trait, local file-backed backend, and the
//! chunk-to-document search pipeline.

pub mod backend;
pub mod embeddings;
pub mod local;
pub mod pipeline;

pub use backend::SearchBackend;
pub use embeddings::{load_chunks, load_query_embeddings};
pub use local::LocalBackend;
pub use pipeline::{run_search, SearchMethod, SearchOptions};
