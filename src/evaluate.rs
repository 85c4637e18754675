// src/evaluate.rs

use crate::error::{MetricError, StoreError};
use crate::metric;
use crate::model::*;
use crate::store::{load_commit_view_with, FactStore};
use crate::strategy::{Ranker, Strategy};
use chrono::{DateTime, Utc};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct EvaluationOptions {
    /// Projects to evaluate; empty means all
    pub projects: Vec<String>,
    pub strategies: Vec<Strategy>,
    pub seed: u64,
    pub progress: bool,
    pub per_commit: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            strategies: Strategy::ALL.to_vec(),
            seed: 42,
            progress: false,
            per_commit: false,
        }
    }
}

/// Scores of every strategy for one commit
#[derive(Debug, Clone, Serialize)]
pub struct CommitOutcome {
    pub project: String,
    pub commit: CommitHash,
    pub timestamp: DateTime<Utc>,
    pub tests: usize,
    pub failures: usize,
    pub scores: BTreeMap<Strategy, f64>,
}

/// A commit that could not be evaluated
#[derive(Debug, Clone, Serialize)]
pub struct CommitWarning {
    pub project: String,
    pub commit: CommitHash,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategySummary {
    pub strategy: Strategy,
    pub commits: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub project: String,
    pub commits: usize,
    pub evaluated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Time range of the evaluated commits
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    /// Sorted by mean score, best first
    pub summaries: Vec<StrategySummary>,
    pub projects: Vec<ProjectSummary>,
    pub warnings: Vec<CommitWarning>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub commits: Vec<CommitOutcome>,
}

impl EvaluationReport {
    pub fn summary(&self, strategy: Strategy) -> Option<&StrategySummary> {
        self.summaries.iter().find(|s| s.strategy == strategy)
    }
}

enum CommitStatus {
    Evaluated(CommitOutcome),
    /// The suite passed; nothing to measure
    Skipped,
    Failed(CommitWarning),
}

#[derive(Debug, thiserror::Error)]
enum CommitError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Metric(#[from] MetricError),
}

/// Scores every strategy's ordering of one commit.
///
/// Returns `Ok(None)` when no test failed.
pub fn evaluate_commit(
    view: &CommitView,
    strategies: &[Strategy],
    seed: u64,
) -> Result<Option<CommitOutcome>, MetricError> {
    if !view.has_failure() {
        return Ok(None);
    }

    let ranker = Ranker::new(view);
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(view.commit.sequence));
    let mut scores = BTreeMap::new();

    for &strategy in strategies {
        let ordering = ranker.rank(strategy, &mut rng);
        let score = metric::score(ordering.iter().copied())?;
        debug!(commit = %view.commit.hash, %strategy, score, "scored ordering");
        scores.insert(strategy, score);
    }

    Ok(Some(CommitOutcome {
        project: view.project.clone(),
        commit: view.commit.hash.clone(),
        timestamp: view.commit.timestamp,
        tests: view.tests().len(),
        failures: view.failure_count(),
        scores,
    }))
}

/// Evaluates every selected commit of every selected project.
///
/// A commit whose facts cannot be loaded or scored is reported as a warning
/// and skipped. Failing to list projects or commits aborts the run.
pub fn evaluate(store: &dyn FactStore, opts: &EvaluationOptions) -> Result<EvaluationReport, StoreError> {
    let mut projects = store.projects()?;
    if !opts.projects.is_empty() {
        if let Some(missing) = opts.projects.iter().find(|id| !projects.iter().any(|p| &p.id == *id)) {
            return Err(StoreError::UnknownProject(missing.clone()));
        }
        projects.retain(|p| opts.projects.contains(&p.id));
    }

    // 1. Collect the work: one item per (project, commit)
    let mut work: Vec<(String, Arc<History>, CommitRecord)> = Vec::new();
    let mut commit_counts = BTreeMap::new();
    for project in &projects {
        let commits = store.commits(&project.id)?;
        commit_counts.insert(project.id.clone(), commits.len());
        let history: Arc<History> = Arc::new(commits.iter().map(|c| (c.hash.clone(), c.clone())).collect());
        work.extend(commits.into_iter().map(|c| (project.id.clone(), Arc::clone(&history), c)));
    }
    info!(projects = projects.len(), commits = work.len(), "evaluating");

    let bar = if opts.progress {
        let bar = ProgressBar::new(work.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} ({eta})") {
            bar.set_style(style);
        }
        bar
    } else {
        ProgressBar::hidden()
    };
    bar.set_message("Evaluating commits");

    // 2. Commits are independent, score them in parallel
    let statuses: Vec<CommitStatus> = work
        .into_par_iter()
        .progress_with(bar.clone())
        .map(|(project, history, record)| {
            let result = load_commit_view_with(store, &project, history, &record.hash)
                .map_err(CommitError::from)
                .and_then(|view| {
                    evaluate_commit(&view, &opts.strategies, opts.seed).map_err(CommitError::from)
                });
            match result {
                Ok(Some(outcome)) => CommitStatus::Evaluated(outcome),
                Ok(None) => {
                    debug!(%project, commit = %record.hash, "all tests passed, skipping");
                    CommitStatus::Skipped
                }
                Err(e) => {
                    warn!(%project, commit = %record.hash, error = %e, "commit not evaluated");
                    CommitStatus::Failed(CommitWarning {
                        project,
                        commit: record.hash,
                        message: e.to_string(),
                    })
                }
            }
        })
        .collect();
    bar.finish_with_message("Evaluation complete");

    // 3. Reduce
    Ok(aggregate(statuses, &commit_counts, opts))
}

fn aggregate(
    statuses: Vec<CommitStatus>,
    commit_counts: &BTreeMap<String, usize>,
    opts: &EvaluationOptions,
) -> EvaluationReport {
    let mut projects: BTreeMap<String, ProjectSummary> = commit_counts
        .iter()
        .map(|(id, &commits)| {
            (
                id.clone(),
                ProjectSummary {
                    project: id.clone(),
                    commits,
                    evaluated: 0,
                    skipped: 0,
                    failed: 0,
                    first: None,
                    last: None,
                },
            )
        })
        .collect();
    let mut scores: BTreeMap<Strategy, Vec<f64>> = BTreeMap::new();
    let mut outcomes = Vec::new();
    let mut warnings = Vec::new();

    for status in statuses {
        match status {
            CommitStatus::Evaluated(outcome) => {
                if let Some(summary) = projects.get_mut(&outcome.project) {
                    summary.evaluated += 1;
                    summary.first = Some(summary.first.map_or(outcome.timestamp, |t| t.min(outcome.timestamp)));
                    summary.last = Some(summary.last.map_or(outcome.timestamp, |t| t.max(outcome.timestamp)));
                }
                for (&strategy, &score) in &outcome.scores {
                    scores.entry(strategy).or_default().push(score);
                }
                outcomes.push(outcome);
            }
            CommitStatus::Skipped => {}
            CommitStatus::Failed(warning) => {
                if let Some(summary) = projects.get_mut(&warning.project) {
                    summary.failed += 1;
                }
                warnings.push(warning);
            }
        }
    }
    for summary in projects.values_mut() {
        summary.skipped = summary.commits - summary.evaluated - summary.failed;
    }

    let mut summaries: Vec<StrategySummary> = scores
        .into_iter()
        .map(|(strategy, values)| summarize(strategy, &values))
        .collect();
    summaries.sort_by(|a, b| b.mean.total_cmp(&a.mean).then(a.strategy.cmp(&b.strategy)));

    // stable output order
    outcomes.sort_by(|a, b| a.project.cmp(&b.project).then(a.timestamp.cmp(&b.timestamp)));
    warnings.sort_by(|a, b| a.project.cmp(&b.project).then(a.commit.cmp(&b.commit)));

    EvaluationReport {
        summaries,
        projects: projects.into_values().collect(),
        warnings,
        commits: if opts.per_commit { outcomes } else { Vec::new() },
    }
}

fn summarize(strategy: Strategy, values: &[f64]) -> StrategySummary {
    let sum: f64 = values.iter().sum();
    StrategySummary {
        strategy,
        commits: values.len(),
        mean: sum / values.len() as f64,
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}
