//! Run evaluation: rank-based metrics over TREC runs and qrels, plus
//! comparison reporting.

pub mod metrics;
pub mod report;

pub use metrics::{evaluate_run, EvalResult, METRIC_NAMES};
pub use report::{format_comparison_table, write_csv};
