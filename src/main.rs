use std::path::PathBuf;

use clap::{command, Parser};
use tausplit::{
    run_core, standard_filter_tree, standard_logging_tree, Config, InMemorySpeciesStore,
};
use tracing_subscriber::EnvFilter;

// See also `clap_cargo::style::CLAP_STYLING`
pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

#[derive(Debug, Parser)]
#[command(
    name = "tausplit",
    about = "Reaction network generation core.",
    long_about = "Builds a reaction network by pairing up species within precomputed atom-count buckets, \
running each candidate pair through a decision-tree filter, and writing the survivors to a \
SQLite reaction store alongside a full audit-trail report.",
    styles = CLAP_STYLING,
)]
struct Cli {
    /// Path to a TOML configuration file. When given, its values are used
    /// as-is; the individual flags below are only consulted when no
    /// config file is supplied.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the read-only bucket store (SQLite).
    #[arg(long, required_unless_present = "config")]
    bucket_db: Option<PathBuf>,

    /// Path to write the reaction store (SQLite) to.
    #[arg(long, required_unless_present = "config")]
    reaction_db: Option<PathBuf>,

    /// Path to the species entries (JSON array of species objects).
    #[arg(long, required_unless_present = "config")]
    species: Option<PathBuf>,

    /// Path to write the audit-trail report to.
    #[arg(long, required_unless_present = "config")]
    report: Option<PathBuf>,

    /// Discard threshold for dG, in eV.
    #[arg(long, default_value_t = 0.5)]
    dg_threshold: f64,

    /// Number of worker threads.
    #[arg(long, default_value_t = 8)]
    number_of_processes: usize,

    /// Rows committed to the reaction store per transaction.
    #[arg(long, default_value_t = 1000)]
    commit_freq: u64,

    /// Enables verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(cli: &Cli) -> Result<Config, tausplit::CoreError> {
    if let Some(path) = &cli.config {
        return Config::load_toml(path);
    }
    Ok(Config::builder()
        .bucket_db_path(cli.bucket_db.clone().expect("clap enforces this when --config is absent"))
        .reaction_db_path(cli.reaction_db.clone().expect("clap enforces this when --config is absent"))
        .report_path(cli.report.clone().expect("clap enforces this when --config is absent"))
        .dg_threshold(cli.dg_threshold)
        .number_of_processes(cli.number_of_processes)
        .commit_freq(cli.commit_freq)
        .verbose(cli.verbose)
        .build())
}

fn run() -> Result<(), tausplit::CoreError> {
    let cli = Cli::parse();
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(&cli)?;
    let species_path = cli
        .species
        .clone()
        .expect("--species is required unless --config supplies species_path separately");
    let species = InMemorySpeciesStore::load_json(&species_path)?;

    let filter_tree = standard_filter_tree(config.dg_threshold);
    let logging_tree = standard_logging_tree();

    let written = run_core(&config, &species, &filter_tree, &logging_tree)?;
    tracing::info!(reactions_written = written, "reaction network generation complete");
    Ok(())
}

pub fn main() {
    if let Err(err) = run() {
        tracing::error!(error = %err, "reaction network generation aborted");
        std::process::exit(1);
    }
}
