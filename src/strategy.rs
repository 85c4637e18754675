// src/strategy.rs

use crate::attribution::Attribution;
use crate::model::{CommitView, TestResult};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::fmt;

/// A way of ordering a commit's test suite
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Uniform random permutation
    Random,
    /// Declaration line, ascending
    LocAsc,
    /// Declaration line, descending
    LocDesc,
    /// Covered line count, ascending
    CoverageAsc,
    /// Covered line count, descending
    CoverageDesc,
    /// Execution time, ascending
    RuntimeAsc,
    /// Execution time, descending
    RuntimeDesc,
    /// Most lines produced by the commit under test first
    LatestCommitCount,
    /// Largest share of lines produced by the commit under test first
    LatestCommitRatio,
    /// Smallest commit-distance sum first
    CommitAheadSum,
    /// Smallest commit-distance per covered line first
    CommitAheadAverage,
}

impl Strategy {
    pub const ALL: [Strategy; 11] = [
        Strategy::Random,
        Strategy::LocAsc,
        Strategy::LocDesc,
        Strategy::CoverageAsc,
        Strategy::CoverageDesc,
        Strategy::RuntimeAsc,
        Strategy::RuntimeDesc,
        Strategy::LatestCommitCount,
        Strategy::LatestCommitRatio,
        Strategy::CommitAheadSum,
        Strategy::CommitAheadAverage,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Random => "random",
            Strategy::LocAsc => "loc-asc",
            Strategy::LocDesc => "loc-desc",
            Strategy::CoverageAsc => "coverage-asc",
            Strategy::CoverageDesc => "coverage-desc",
            Strategy::RuntimeAsc => "runtime-asc",
            Strategy::RuntimeDesc => "runtime-desc",
            Strategy::LatestCommitCount => "latest-commit-count",
            Strategy::LatestCommitRatio => "latest-commit-ratio",
            Strategy::CommitAheadSum => "commit-ahead-sum",
            Strategy::CommitAheadAverage => "commit-ahead-average",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Orders the tests of one commit. Attribution is computed once on
/// construction and shared by every strategy.
pub struct Ranker<'v> {
    view: &'v CommitView,
    attribution: Attribution,
}

impl<'v> Ranker<'v> {
    pub fn new(view: &'v CommitView) -> Self {
        Self { view, attribution: Attribution::compute(view) }
    }

    pub fn attribution(&self) -> &Attribution {
        &self.attribution
    }

    /// Returns a permutation of the commit's tests.
    pub fn rank<R: Rng + ?Sized>(&self, strategy: Strategy, rng: &mut R) -> Vec<&'v TestResult> {
        let mut tests: Vec<&'v TestResult> = self.view.tests().iter().collect();
        let attr = &self.attribution;

        match strategy {
            Strategy::Random => tests.shuffle(rng),
            Strategy::LocAsc => sort_by_key(&mut tests, |t| f64::from(t.line)),
            Strategy::LocDesc => sort_by_key(&mut tests, |t| -f64::from(t.line)),
            Strategy::CoverageAsc => sort_by_key(&mut tests, |t| attr.covered_line_count(&t.id) as f64),
            Strategy::CoverageDesc => sort_by_key(&mut tests, |t| -(attr.covered_line_count(&t.id) as f64)),
            Strategy::RuntimeAsc => sort_by_key(&mut tests, |t| t.duration),
            Strategy::RuntimeDesc => sort_by_key(&mut tests, |t| -t.duration),
            Strategy::LatestCommitCount => {
                sort_by_key(&mut tests, |t| -(attr.latest_commit_count(&t.id) as f64))
            }
            Strategy::LatestCommitRatio => sort_by_key(&mut tests, |t| {
                -(attr.latest_commit_count(&t.id) as f64) / attr.covered_line_count(&t.id) as f64
            }),
            Strategy::CommitAheadSum => sort_by_key(&mut tests, |t| attr.ahead_count(&t.id) as f64),
            Strategy::CommitAheadAverage => sort_by_key(&mut tests, |t| {
                attr.ahead_count(&t.id) as f64 / attr.covered_line_count(&t.id) as f64
            }),
        }

        tests
    }
}

/// One-shot ranking of a commit, computing attribution on the way.
pub fn rank<'v, R: Rng + ?Sized>(view: &'v CommitView, strategy: Strategy, rng: &mut R) -> Vec<&'v TestResult> {
    Ranker::new(view).rank(strategy, rng)
}

// Stable; ties go to the shorter test.
fn sort_by_key<F>(tests: &mut [&TestResult], key: F)
where
    F: Fn(&TestResult) -> f64,
{
    tests.sort_by(|a, b| {
        key(*a)
            .total_cmp(&key(*b))
            .then_with(|| a.duration.total_cmp(&b.duration))
    });
}
