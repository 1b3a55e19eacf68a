use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bulkenrich")]
#[command(about = "Bulk website enrichment with bounded concurrency", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $BULKENRICH_CONFIG or config/bulkenrich.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Enrich a list of websites and print the resulting brand board as JSON
    Enrich(EnrichArgs),
    /// Print the effective configuration as TOML
    Config,
}

#[derive(clap::Args, Debug)]
pub struct EnrichArgs {
    /// File with comma- or newline-separated websites ("-" reads stdin)
    #[arg(long, short, default_value = "-")]
    pub input: PathBuf,

    /// Write JSON here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Override runner.concurrency
    #[arg(long, short)]
    pub concurrency: Option<usize>,
}
