use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use intronic::batch::{self, BatchStats};
use intronic::cli;
use intronic::config::BatchConfig;
use intronic::store::{JsonLinesStore, ORGANISMS_FILE, ORPHANS_FILE, SEQUENCES_FILE};

#[derive(Parser)]
#[command(
    name = "fill_introns",
    about = "Reconstruct exons and introns from GenBank flat files"
)]
struct Cli {
    /// GenBank files (.gbk or .gbk.gz)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output directory
    #[arg(short = 'o', long = "out")]
    out: PathBuf,

    /// Worker threads (0 = one per core)
    #[arg(short = 't', long = "threads")]
    threads: Option<usize>,

    /// Optional JSON configuration file
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Write each sequence's origin as zstd-compressed FASTA
    #[arg(long = "store-origins")]
    store_origins: bool,

    /// Log filter, e.g. `info` or `intronic=debug` (overrides RUST_LOG)
    #[arg(long = "log-level")]
    log_level: Option<String>,
}

fn init_tracing(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level '{level}'"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {e}"))
}

fn main() -> Result<()> {
    let start = Instant::now();
    let cli_args = Cli::parse();
    init_tracing(cli_args.log_level.as_deref())?;

    cli::banner("Fill Introns");

    // ── Configuration ────────────────────────────────────
    cli::section("Configuration");

    let config = match &cli_args.config {
        Some(path) => BatchConfig::from_file(path)?,
        None => BatchConfig::default(),
    };
    let requested = cli_args.threads.or(config.threads).unwrap_or(0);
    let threads = batch::resolve_threads(requested, cli_args.files.len());

    if let Some(path) = &cli_args.config {
        cli::kv("Config", &path.display().to_string());
    }
    cli::kv("Files", &cli_args.files.len().to_string());
    cli::kv("Threads", &threads.to_string());
    cli::kv("Output", &cli_args.out.display().to_string());
    if let Some(name) = &config.organism_name {
        cli::kv("Organism", name);
    }
    if cli_args.store_origins {
        cli::kv("Origins", "zstd FASTA");
    }

    eprintln!();

    // ── Parsing ──────────────────────────────────────────
    cli::section("Parsing");

    let store = JsonLinesStore::create(&cli_args.out, cli_args.store_origins)
        .with_context(|| format!("failed to create output: {}", cli_args.out.display()))?;
    let stats: BatchStats = batch::run_batch(&cli_args.files, threads, &store, &config)
        .context("batch processing failed")?;

    cli::kv("Files processed", &stats.files_processed.to_string());
    if stats.files_skipped > 0 {
        cli::warning(&format!("{} file(s) could not be read", stats.files_skipped));
    }
    if stats.files_incomplete > 0 {
        cli::warning(&format!(
            "{} file(s) stopped early, records read before the failure were kept",
            stats.files_incomplete
        ));
    }
    cli::kv("Sequences", &stats.sequences.to_string());
    cli::kv("Genes", &stats.genes.to_string());
    cli::kv("Isoforms", &stats.isoforms.to_string());

    eprintln!();

    // ── Output ───────────────────────────────────────────
    cli::section("Output");

    let summary = store.finish().context("failed to finish output")?;
    cli::kv(SEQUENCES_FILE, &summary.sequences.to_string());
    cli::kv(ORPHANS_FILE, &summary.orphans.to_string());
    cli::kv(ORGANISMS_FILE, &summary.organisms.to_string());
    cli::success(&format!("written to {}", cli_args.out.display()));

    // ── Summary ──────────────────────────────────────────
    cli::print_summary(start);
    Ok(())
}
