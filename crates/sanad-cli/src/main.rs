//! Sanad CLI
//!
//! Command-line interface for verifying detected Quran and Hadith spans,
//! running the lexical retrievers, merging verse candidates, and inspecting
//! checkpoint files.
//!
//! Logs go to stderr; stdout carries results (JSON where noted).

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use sanad_core::checkpoint::load_results;
use sanad_core::config::supported_models;
use sanad_core::search::load_corpus;
use sanad_core::{
    ChatVerifier, CheckpointStore, Config, HadithSearchEngine, MergePolicy, Provider,
    QuranCorpus, QuranSearchEngine, RetryingVerifier, RunError, RunReport, VerificationOrchestrator,
    VerificationResult, VerseRecord, merge_verses,
};

/// Sanad - scriptural span verification CLI
#[derive(Parser)]
#[command(name = "sanad")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Verify Quran and Hadith spans against retrieval candidates")]
#[command(long_about = "Sanad decides which retrieval candidate (if any) is the source of a quoted \
Quran or Hadith span.\n\nSettings come from the environment (and a .env file); flags override them.")]
struct Cli {
    /// Log as JSON lines instead of text
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run verification over the input queries, resuming from the checkpoint
    Verify {
        #[command(flatten)]
        overrides: Overrides,

        /// Only process the first N queries
        #[arg(long)]
        limit: Option<usize>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search a Quran corpus by word coverage and proximity
    SearchQuran {
        /// Quran corpus JSON (list of verses)
        corpus: PathBuf,
        /// Query text
        query: String,
        /// Number of results
        #[arg(short = 'k', long, default_value = "20")]
        top_k: usize,
    },

    /// Search a Hadith corpus by character n-gram similarity
    SearchHadith {
        /// Hadith corpus JSON (list of records)
        corpus: PathBuf,
        /// Query text
        query: String,
        /// Number of results
        #[arg(short = 'k', long, default_value = "20")]
        top_k: usize,
    },

    /// Merge consecutive verse candidates from a JSON list of verse records
    Merge {
        /// Verse candidate JSON file
        file: PathBuf,
    },

    /// Summarize a results file per span type
    Summary {
        /// Results (checkpoint) JSON file
        file: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        #[command(flatten)]
        overrides: Overrides,

        /// List known-good models for each provider
        #[arg(long)]
        models: bool,
    },
}

/// Flags that override environment settings
#[derive(Args, Debug, Default, Clone)]
struct Overrides {
    /// Model provider: openai or ollama
    #[arg(long)]
    provider: Option<Provider>,
    /// Model name for the selected provider
    #[arg(long)]
    model: Option<String>,
    /// Input query file
    #[arg(long)]
    input: Option<PathBuf>,
    /// Canonical results file name
    #[arg(long)]
    output: Option<String>,
    /// Root directory for per-model results folders
    #[arg(long)]
    results_dir: Option<PathBuf>,
    /// Verse merge policy: exact-ayah or all-verse
    #[arg(long)]
    merge_policy: Option<MergePolicy>,
    /// Strip diacritics before verification (true/false)
    #[arg(long)]
    remove_diacritics: Option<bool>,
    /// Keep a timestamped results copy after every query
    #[arg(long)]
    keep_step_snapshots: bool,
}

impl Overrides {
    fn apply(&self, config: &mut Config) {
        if let Some(provider) = self.provider {
            config.provider = provider;
        }
        if let Some(model) = &self.model {
            match config.provider {
                Provider::OpenAi => config.openai_model = model.clone(),
                Provider::Ollama => config.ollama_model = model.clone(),
            }
        }
        if let Some(input) = &self.input {
            config.input_file = input.clone();
        }
        if let Some(output) = &self.output {
            config.output_file = output.clone();
        }
        if let Some(dir) = &self.results_dir {
            config.results_dir = dir.clone();
        }
        if let Some(policy) = self.merge_policy {
            config.merge_policy = policy;
        }
        if let Some(remove) = self.remove_diacritics {
            config.remove_diacritics = remove;
        }
        if self.keep_step_snapshots {
            config.keep_step_snapshots = true;
        }
    }

    fn load(&self) -> anyhow::Result<Config> {
        let mut config = Config::from_env().context("Failed to read configuration")?;
        self.apply(&mut config);
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing .env is fine
    let _ = dotenvy::dotenv();

    init_logging(cli.log_json);

    match cli.command {
        Commands::Verify {
            overrides,
            limit,
            json,
        } => run_verify(overrides, limit, json).await,
        Commands::SearchQuran {
            corpus,
            query,
            top_k,
        } => run_search_quran(corpus, query, top_k),
        Commands::SearchHadith {
            corpus,
            query,
            top_k,
        } => run_search_hadith(corpus, query, top_k),
        Commands::Merge { file } => run_merge(file),
        Commands::Summary { file, json } => run_summary(file, json),
        Commands::Config { overrides, models } => run_config(overrides, models),
    }
}

/// Logging to stderr so stdout stays parseable
fn init_logging(json: bool) {
    let filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

// ============================================================================
// VERIFY
// ============================================================================

async fn run_verify(overrides: Overrides, limit: Option<usize>, json: bool) -> anyhow::Result<()> {
    let mut config = overrides.load()?;
    config.validate()?;

    let mut queries = sanad_core::load_queries(&config.input_file)
        .with_context(|| format!("Failed to read queries from {}", config.input_file.display()))?;
    if let Some(limit) = limit {
        queries.truncate(limit);
    }

    let folder = config.results_folder();
    tracing::info!(
        queries = queries.len(),
        folder = %folder.display(),
        merge_policy = %config.merge_policy,
        "Starting verification"
    );

    let verifier = RetryingVerifier::new(ChatVerifier::from_config(&config)?, config.retry_policy());
    let store = CheckpointStore::open(&folder, &config.output_file, config.keep_step_snapshots)?;
    let mut orchestrator =
        VerificationOrchestrator::new(verifier, store, config.orchestrator_config());

    match orchestrator.run(queries).await {
        Ok(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report, &config.output_path());
            }
            Ok(())
        }
        Err(RunError::Fatal {
            sequence_id,
            source,
        }) => {
            eprintln!(
                "{} verifier failed on {}: {}",
                "Run aborted:".red().bold(),
                sequence_id,
                source
            );
            eprintln!(
                "Progress so far is saved in {}; rerun to resume.",
                config.output_path().display()
            );
            Err(anyhow::anyhow!("verification aborted"))
        }
        Err(e) => Err(e.into()),
    }
}

fn print_report(report: &RunReport, output: &std::path::Path) {
    println!("{}", "=== Sanad Verification Run ===".cyan().bold());
    println!();
    println!("{}: {}", "Run".white().bold(), report.run_id);
    println!("{}: {}", "Processed".white().bold(), report.processed);
    println!("{}: {}", "From Checkpoint".white().bold(), report.cached);
    println!("{}: {}", "Matched".white().bold(), report.matched.to_string().green());
    println!("{}: {}", "Verifier Calls".white().bold(), report.verifier_calls);
    println!("{}: {}", "Reused Verdicts".white().bold(), report.reused);

    if let Some(finished) = report.finished_at {
        let elapsed = finished - report.started_at;
        println!("{}: {}s", "Elapsed".white().bold(), elapsed.num_seconds());
    }

    if !report.failures.is_empty() {
        println!();
        println!("{}", format!("{} failed queries", report.failures.len()).red().bold());
        for failure in &report.failures {
            println!("  {} {}", failure.sequence_id.yellow(), failure.error);
        }
    }

    println!();
    println!("{}: {}", "Results".white().bold(), output.display());
}

// ============================================================================
// SEARCH
// ============================================================================

fn run_search_quran(corpus: PathBuf, query: String, top_k: usize) -> anyhow::Result<()> {
    let corpus = QuranCorpus::load(&corpus)
        .with_context(|| format!("Failed to load Quran corpus {}", corpus.display()))?;
    let engine = QuranSearchEngine::from_corpus(corpus);

    let hits = engine.search(&query, top_k);
    println!("{}", serde_json::to_string_pretty(&hits)?);
    Ok(())
}

fn run_search_hadith(corpus: PathBuf, query: String, top_k: usize) -> anyhow::Result<()> {
    let records = load_corpus(&corpus)
        .with_context(|| format!("Failed to load Hadith corpus {}", corpus.display()))?;
    let engine = HadithSearchEngine::build(records)?;
    tracing::info!(
        records = engine.len(),
        vocabulary = engine.vocabulary_size(),
        "Hadith index built"
    );

    let hits = engine.search(&query, top_k);
    println!("{}", serde_json::to_string_pretty(&hits)?);
    Ok(())
}

// ============================================================================
// MERGE
// ============================================================================

fn run_merge(file: PathBuf) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let records: Vec<VerseRecord> =
        serde_json::from_str(&raw).context("Expected a JSON list of verse records")?;

    let merged = merge_verses(&records);
    tracing::info!(input = records.len(), output = merged.len(), "Merged verse candidates");
    println!("{}", serde_json::to_string_pretty(&merged)?);
    Ok(())
}

// ============================================================================
// SUMMARY
// ============================================================================

/// Per span type counts over a results file
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
struct SpanSummary {
    queries: usize,
    matched: usize,
    unmatched: usize,
    /// Candidates that carry a verdict
    evaluated_candidates: usize,
}

fn summarize(results: &[VerificationResult]) -> BTreeMap<String, SpanSummary> {
    let mut by_span: BTreeMap<String, SpanSummary> = BTreeMap::new();
    for result in results {
        let entry = by_span.entry(result.span_type.clone()).or_default();
        entry.queries += 1;
        if result.is_matched() {
            entry.matched += 1;
        } else {
            entry.unmatched += 1;
        }
        entry.evaluated_candidates += result
            .matches
            .iter()
            .filter(|m| m.detection().is_some())
            .count();
    }
    by_span
}

fn run_summary(file: PathBuf, json: bool) -> anyhow::Result<()> {
    let results = load_results(&file)?;
    let summary = summarize(&results);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "=== Results Summary ===".cyan().bold());
    println!("{}: {}", "File".white().bold(), file.display());
    println!("{}: {}", "Queries".white().bold(), results.len());
    println!();

    if summary.is_empty() {
        println!("{}", "No results found.".dimmed());
        return Ok(());
    }

    println!(
        "  {:15} {:>8} {:>8} {:>10} {:>11}",
        "Span Type".bold(),
        "Queries".bold(),
        "Matched".bold(),
        "Unmatched".bold(),
        "Candidates".bold()
    );
    for (span, counts) in &summary {
        println!(
            "  {:15} {:>8} {:>8} {:>10} {:>11}",
            span,
            counts.queries,
            counts.matched.to_string().green(),
            counts.unmatched.to_string().yellow(),
            counts.evaluated_candidates
        );
    }
    Ok(())
}

// ============================================================================
// CONFIG
// ============================================================================

fn run_config(overrides: Overrides, show_models: bool) -> anyhow::Result<()> {
    let config = overrides.load()?;

    println!("{}", "=== Sanad Configuration ===".cyan().bold());
    println!();
    println!("{}: {}", "Provider".white().bold(), config.provider);
    println!("{}: {}", "Model".white().bold(), config.model_name());
    println!("{}: {}", "Base URL".white().bold(), config.base_url());
    println!("{}: {}", "Temperature".white().bold(), config.temperature());
    if config.provider == Provider::OpenAi {
        let key = if config.openai_api_key.is_some() {
            "set".green()
        } else {
            "missing".red()
        };
        println!("{}: {}", "API Key".white().bold(), key);
        println!("{}: {}", "Max Tokens".white().bold(), config.openai_max_tokens);
    }
    println!("{}: {}", "Input".white().bold(), config.input_file.display());
    println!("{}: {}", "Results".white().bold(), config.output_path().display());
    println!("{}: {}", "Remove Diacritics".white().bold(), config.remove_diacritics);
    println!("{}: {}", "Merge Policy".white().bold(), config.merge_policy);
    println!("{}: {}", "Step Snapshots".white().bold(), config.keep_step_snapshots);
    println!(
        "{}: {} attempts, {}s timeout",
        "Retry".white().bold(),
        config.verify_max_attempts,
        config.verify_timeout.as_secs()
    );

    if !supported_models(config.provider).contains(&config.model_name()) {
        println!();
        println!(
            "{} {} is not in the known model list for {}",
            "Note:".yellow().bold(),
            config.model_name(),
            config.provider
        );
    }

    if show_models {
        for provider in [Provider::OpenAi, Provider::Ollama] {
            println!();
            println!("{}", format!("=== {provider} models ===").yellow().bold());
            for model in supported_models(provider) {
                println!("  {model}");
            }
        }
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
