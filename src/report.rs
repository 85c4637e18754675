// src/report.rs

use crate::cli::Format;
use crate::error::{Error, Result};
use crate::evaluate::EvaluationReport;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub fn render(report: &EvaluationReport, format: Format) -> Result<String> {
    match format {
        Format::Table => Ok(render_table(report)),
        Format::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

/// Writes the rendered report to `output`, or stdout when absent.
pub fn write_report(report: &EvaluationReport, format: Format, output: Option<&Path>) -> Result<()> {
    let text = render(report, format)?;
    match output {
        Some(path) => fs::write(path, text).map_err(|source| Error::Output {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

pub fn render_table(report: &EvaluationReport) -> String {
    let mut out = String::new();

    for p in &report.projects {
        let _ = write!(
            out,
            "{}: {} commits, {} evaluated, {} all-passing, {} failed",
            p.project, p.commits, p.evaluated, p.skipped, p.failed
        );
        if let (Some(first), Some(last)) = (p.first, p.last) {
            let _ = write!(out, " ({} to {})", first.to_rfc2822(), last.to_rfc2822());
        }
        out.push('\n');
    }
    out.push('\n');

    if report.summaries.is_empty() {
        out.push_str("No commit with a failing test was evaluated.\n");
    } else {
        let _ = writeln!(out, "{:<22} {:>8} {:>8} {:>8} {:>8}", "strategy", "commits", "mean", "min", "max");
        for s in &report.summaries {
            let _ = writeln!(
                out,
                "{:<22} {:>8} {:>8.2} {:>8.2} {:>8.2}",
                s.strategy.name(),
                s.commits,
                s.mean,
                s.min,
                s.max
            );
        }
    }

    if !report.commits.is_empty() {
        out.push('\n');
        for c in &report.commits {
            let _ = writeln!(
                out,
                "{} {} ({} tests, {} failing)",
                c.project, c.commit, c.tests, c.failures
            );
            for (strategy, score) in &c.scores {
                let _ = writeln!(out, "  {:<22} {:>8.2}", strategy.name(), score);
            }
        }
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(out, "\n{} commit(s) not evaluated:", report.warnings.len());
        for w in &report.warnings {
            let _ = writeln!(out, "  {} {}: {}", w.project, w.commit, w.message);
        }
    }

    out
}
