// src/cli.rs

use crate::strategy::Strategy;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Root directory of the extracted fact store
    #[arg(short, long)]
    pub facts: PathBuf,

    /// Only evaluate these projects (repeatable)
    #[arg(short, long = "project")]
    pub projects: Vec<String>,

    /// Only run these strategies (repeatable)
    #[arg(short, long = "strategy", value_enum)]
    pub strategies: Vec<Strategy>,

    /// Seed for the random ordering
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Include every commit's scores in the report
    #[arg(long)]
    pub per_commit: bool,

    /// Log per-commit progress
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum Format {
    /// Human-readable summary table
    Table,
    /// Machine-readable JSON
    Json,
}
