//! ragbench CLI - retrieval benchmark pipeline
//!
//! Three stages: build a candidate-pool subset from BEIR datasets, run
//! retrieval over it, and evaluate the resulting TREC runs.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use ragbench_core::io::{read_qrels, read_trec_run, write_trec_run, JsonlReader};
use ragbench_core::Query;
use ragbench_eval::{evaluate_run, format_comparison_table, write_csv};
use ragbench_search::{
    load_chunks, load_query_embeddings, run_search, LocalBackend, SearchMethod, SearchOptions,
};
use ragbench_subset::{build_subset, parse_ratio, write_subset, DatasetPaths, SubsetOptions};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "ragbench")]
#[command(about = "Retrieval quality benchmarking over BEIR-style datasets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a candidate-pool subset from one or more datasets
    Subset(SubsetArgs),
    /// Run retrieval over a subset and write a TREC run
    Search(SearchArgs),
    /// Evaluate TREC runs against qrels
    Evaluate(EvaluateArgs),
}

#[derive(Args)]
struct SubsetArgs {
    /// Corpus JSONL files, one per dataset
    #[arg(long, value_delimiter = ',', required = true)]
    corpus: Vec<PathBuf>,

    /// Query JSONL files, aligned with --corpus
    #[arg(long, value_delimiter = ',', required = true)]
    queries: Vec<PathBuf>,

    /// Qrels TSV files, aligned with --corpus
    #[arg(long, value_delimiter = ',', required = true)]
    qrels: Vec<PathBuf>,

    /// Output directory for corpus.jsonl, queries.jsonl and qrels.tsv
    #[arg(long)]
    output: PathBuf,

    /// Total queries to sample across all datasets
    #[arg(long, default_value_t = 200)]
    n_queries: usize,

    /// BM25 pool depth per sampled query
    #[arg(long, default_value_t = 200)]
    bm25_top_m: usize,

    /// Cap on non-relevant documents loaded per dataset (0 = unlimited)
    #[arg(long, default_value_t = 100_000)]
    max_docs_per_dataset: usize,

    /// Per-dataset query allocation, e.g. 3:1
    #[arg(long)]
    query_ratio: Option<String>,

    /// Random seed for query sampling
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Args)]
struct SearchArgs {
    /// Subset queries JSONL
    #[arg(long)]
    queries: PathBuf,

    /// Chunk embeddings JSONL (enables vector and hybrid search)
    #[arg(long)]
    embeddings: Option<PathBuf>,

    /// Corpus JSONL for a keyword-only backend when no embeddings exist
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Query embeddings JSONL, required for vector and hybrid search
    #[arg(long)]
    query_embeddings: Option<PathBuf>,

    /// Retrieval method: bm25, vector or hybrid
    #[arg(long, default_value = "bm25")]
    method: String,

    /// Documents kept per query
    #[arg(long, default_value_t = 100)]
    top_k: usize,

    /// Chunk retrieval depth as a multiple of top-k
    #[arg(long, default_value_t = 10)]
    retrieval_multiplier: usize,

    /// Chunk aggregation: max_p, top_m_sum, top_m_avg or rrf_per_doc
    #[arg(long, default_value = "max_p")]
    agg_method: String,

    /// m for the top-m aggregation policies
    #[arg(long, default_value_t = 3)]
    agg_m: usize,

    /// RRF constant for hybrid fusion
    #[arg(long, default_value_t = 60)]
    rrf_k: usize,

    /// Run id in the TREC output; defaults to local.{method}
    #[arg(long)]
    run_id: Option<String>,

    /// Output TREC run file
    #[arg(long)]
    output: PathBuf,
}

#[derive(Args)]
struct EvaluateArgs {
    /// TREC run files to evaluate
    #[arg(long, required = true, num_args = 1..)]
    runs: Vec<PathBuf>,

    /// Qrels TSV
    #[arg(long)]
    qrels: PathBuf,

    /// Optional CSV output path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Subset(args) => subset_command(args),
        Commands::Search(args) => search_command(args).await,
        Commands::Evaluate(args) => evaluate_command(args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = [
        "ragbench",
        "ragbench_core",
        "ragbench_retrieval",
        "ragbench_subset",
        "ragbench_search",
        "ragbench_eval",
    ]
    .map(|target| format!("{target}={level}"))
    .join(",");

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn subset_command(args: SubsetArgs) -> Result<()> {
    if args.corpus.len() != args.queries.len() || args.corpus.len() != args.qrels.len() {
        return Err(anyhow!(
            "--corpus, --queries and --qrels must list the same number of files"
        ));
    }

    let datasets: Vec<DatasetPaths> = args
        .corpus
        .iter()
        .zip(&args.queries)
        .zip(&args.qrels)
        .map(|((corpus, queries), qrels)| DatasetPaths::new(corpus, queries, qrels))
        .collect();

    let options = SubsetOptions {
        n_queries: args.n_queries,
        bm25_top_m: args.bm25_top_m,
        max_docs_per_dataset: (args.max_docs_per_dataset > 0).then_some(args.max_docs_per_dataset),
        seed: args.seed,
        query_ratio: args
            .query_ratio
            .as_deref()
            .map(parse_ratio)
            .transpose()?,
    };

    let subset = build_subset(&datasets, &options)?;
    write_subset(&subset, &args.output)?;
    info!(
        output = %args.output.display(),
        corpus = subset.corpus.len(),
        queries = subset.queries.len(),
        "subset written"
    );
    Ok(())
}

async fn search_command(args: SearchArgs) -> Result<()> {
    let method: SearchMethod = args.method.parse()?;
    if method != SearchMethod::Bm25 && args.query_embeddings.is_none() {
        return Err(anyhow!(
            "--query-embeddings is required for vector and hybrid search"
        ));
    }

    let backend = if let Some(embeddings) = &args.embeddings {
        LocalBackend::from_chunks(load_chunks(embeddings)?)
    } else if let Some(corpus) = &args.corpus {
        if method != SearchMethod::Bm25 {
            return Err(anyhow!("--embeddings is required for {method} search"));
        }
        LocalBackend::from_corpus(JsonlReader::read_all(corpus)?)
    } else {
        return Err(anyhow!("either --embeddings or --corpus is required"));
    };

    let queries: Vec<Query> = JsonlReader::read_all(&args.queries)?;
    let query_embeddings = match &args.query_embeddings {
        Some(path) => load_query_embeddings(path)?,
        None => HashMap::new(),
    };

    let options = SearchOptions {
        method,
        top_k: args.top_k,
        retrieval_multiplier: args.retrieval_multiplier,
        agg_method: args.agg_method.parse()?,
        agg_m: args.agg_m,
        rrf_k: args.rrf_k,
        run_id: args.run_id,
    };

    let results = run_search(&backend, &queries, &query_embeddings, &options).await?;
    write_trec_run(&args.output, &options.run_id(), &results)?;
    info!(
        output = %args.output.display(),
        queries = results.len(),
        "run written"
    );
    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    let qrels = read_qrels(&args.qrels)?;

    let mut rows = Vec::new();
    for run_path in &args.runs {
        let run = read_trec_run(run_path)?;
        let name = run_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| run_path.display().to_string());
        rows.push((name, evaluate_run(&run, &qrels)));
    }

    println!("{}", format_comparison_table(&rows));
    if let Some(csv) = &args.output {
        write_csv(csv, &rows)?;
        info!(output = %csv.display(), "results written");
    }
    Ok(())
}
