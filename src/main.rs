// src/main.rs

use clap::Parser;
use std::process::ExitCode;
use std::time::Instant;
use test_prio::cli::Args;
use test_prio::evaluate::{self, EvaluationOptions};
use test_prio::report;
use test_prio::store::JsonStore;
use test_prio::strategy::Strategy;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> test_prio::Result<()> {
    let store = JsonStore::open(&args.facts);
    let opts = EvaluationOptions {
        projects: args.projects.clone(),
        strategies: if args.strategies.is_empty() {
            Strategy::ALL.to_vec()
        } else {
            args.strategies.clone()
        },
        seed: args.seed,
        progress: !args.quiet,
        per_commit: args.per_commit,
    };

    let report = evaluate::evaluate(&store, &opts)?;
    report::write_report(&report, args.format, args.output.as_deref())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);
    let start_time = Instant::now();

    let code = match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error evaluating {}: {}", args.facts.display(), e);
            ExitCode::FAILURE
        }
    };

    if !args.quiet {
        eprintln!("Total time: {:.2?}", start_time.elapsed());
    }
    code
}
