// src/model.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Uniquely identifies a commit within a project
pub type CommitHash = String;

/// Repository-relative path of a source file
pub type FilePath = String;

/// Uniquely identifies a test case within a commit
pub type TestId = String;

/// Owning commit hash per line, index 0 = line 1
pub type Blame = Vec<CommitHash>;

/// Sorted set of 1-based line numbers a test executed in one file
pub type LineSet = BTreeSet<u32>;

/// Maps a file to the lines one test covered in it
pub type FileCoverage = BTreeMap<FilePath, LineSet>;

/// A project's commit records keyed by hash
pub type History = HashMap<CommitHash, CommitRecord>;

/// One studied repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub repository: String,
}

/// A commit as recorded by the history walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub hash: CommitHash,
    #[serde(default)]
    pub parent: Option<CommitHash>,
    pub timestamp: DateTime<Utc>,
    /// Lower = more recent. Unique within a project.
    pub sequence: u64,
    #[serde(default)]
    pub added_loc: u32,
    #[serde(default)]
    pub deleted_loc: u32,
}

/// A contiguous diff region relative to the commit's parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, u32, u32, u32)", into = "(u32, u32, u32, u32)")]
pub struct Hunk {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
}

impl Hunk {
    pub fn new(old_start: u32, old_count: u32, new_start: u32, new_count: u32) -> Self {
        Self { old_start, old_count, new_start, new_count }
    }

    pub fn is_pure_insertion(&self) -> bool {
        self.old_count == 0 && self.new_count > 0
    }
}

impl From<(u32, u32, u32, u32)> for Hunk {
    fn from((old_start, old_count, new_start, new_count): (u32, u32, u32, u32)) -> Self {
        Self::new(old_start, old_count, new_start, new_count)
    }
}

impl From<Hunk> for (u32, u32, u32, u32) {
    fn from(h: Hunk) -> Self {
        (h.old_start, h.old_count, h.new_start, h.new_count)
    }
}

/// Outcome of one test case observed for a commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: TestId,
    pub passed: bool,
    /// Execution time in seconds
    pub duration: f64,
    /// Line number the test is declared at
    pub line: u32,
}

impl TestResult {
    pub fn failed(&self) -> bool {
        !self.passed
    }
}

/// Everything extracted for a single commit, as stored.
///
/// Blame, tests and coverage all describe the same tree state, so line
/// numbers can be compared across them directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitFacts {
    #[serde(default)]
    pub blames: HashMap<FilePath, Blame>,
    #[serde(default)]
    pub hunks: HashMap<FilePath, Vec<Hunk>>,
    #[serde(default)]
    pub tests: Vec<TestResult>,
    #[serde(default)]
    pub coverage: HashMap<TestId, FileCoverage>,
}

/// Immutable bundle of the relations needed to evaluate one commit
#[derive(Debug, Clone)]
pub struct CommitView {
    pub project: String,
    pub commit: CommitRecord,
    /// Shared by every view of the same project
    pub history: Arc<History>,
    pub facts: CommitFacts,
}

impl CommitView {
    pub fn tests(&self) -> &[TestResult] {
        &self.facts.tests
    }

    pub fn has_failure(&self) -> bool {
        self.facts.tests.iter().any(TestResult::failed)
    }

    pub fn failure_count(&self) -> usize {
        self.facts.tests.iter().filter(|t| t.failed()).count()
    }

    pub fn coverage_of(&self, test: &str) -> Option<&FileCoverage> {
        self.facts.coverage.get(test)
    }

    pub fn blame_of(&self, file: &str) -> Option<&Blame> {
        self.facts.blames.get(file)
    }

    pub fn hunks_of(&self, file: &str) -> &[Hunk] {
        self.facts.hunks.get(file).map_or(&[], Vec::as_slice)
    }

    pub fn sequence_of(&self, hash: &str) -> Option<u64> {
        self.history.get(hash).map(|c| c.sequence)
    }
}
