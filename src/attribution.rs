// src/attribution.rs

use crate::model::*;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Count of a test's covered lines attributable to each owning commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoveringHashes {
    counts: HashMap<CommitHash, u64>,
}

impl CoveringHashes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, hash: &str, n: u64) {
        if n == 0 {
            return;
        }
        *self.counts.entry(hash.to_string()).or_insert(0) += n;
    }

    pub fn merge(&mut self, other: CoveringHashes) {
        for (hash, n) in other.counts {
            *self.counts.entry(hash).or_insert(0) += n;
        }
    }

    pub fn count(&self, hash: &str) -> u64 {
        self.counts.get(hash).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.counts.iter().map(|(h, &n)| (h.as_str(), n))
    }
}

impl<'a> FromIterator<(&'a str, u64)> for CoveringHashes {
    fn from_iter<I: IntoIterator<Item = (&'a str, u64)>>(iter: I) -> Self {
        let mut hashes = CoveringHashes::new();
        for (hash, n) in iter {
            hashes.add(hash, n);
        }
        hashes
    }
}

/// Attributes the lines `test` covers in `view` to the commits that own them.
pub fn covering_hashes(view: &CommitView, test: &str) -> CoveringHashes {
    let mut hashes = CoveringHashes::new();
    let Some(coverage) = view.coverage_of(test) else {
        return hashes;
    };

    for (file, covered) in coverage {
        let Some(blame) = view.blame_of(file) else {
            warn!(project = %view.project, commit = %view.commit.hash, %test, %file, "covered file has no blame, skipping");
            continue;
        };
        hashes.merge(file_covering_hashes(
            &view.commit.hash,
            blame,
            view.hunks_of(file),
            covered,
        ));
    }

    hashes
}

/// Attribution for a single file.
///
/// Inserted lines have no blame entry at the parent state, so they are
/// credited to `commit` when the test covered both neighbours of the
/// insertion point. A boundary past either end of the file counts as covered.
///
/// Deleted and modified regions are not re-attributed. Coverage was measured
/// at the parent state, where blame for those lines is still accurate.
pub fn file_covering_hashes(
    commit: &str,
    blame: &[CommitHash],
    hunks: &[Hunk],
    covered: &LineSet,
) -> CoveringHashes {
    let mut hashes = CoveringHashes::new();
    let file_length = blame.len() as u32;

    for hunk in hunks.iter().filter(|h| h.is_pure_insertion()) {
        let prev_covered = hunk.new_start <= 1 || covered.contains(&(hunk.new_start - 1));
        let next_covered = hunk.new_start > file_length || covered.contains(&hunk.new_start);
        if prev_covered && next_covered {
            hashes.add(commit, u64::from(hunk.new_count));
        }
    }

    for &line in covered {
        match line.checked_sub(1).and_then(|i| blame.get(i as usize)) {
            Some(owner) => hashes.add(owner, 1),
            None => warn!(%commit, line, file_length, "covered line outside blame range"),
        }
    }

    hashes
}

/// Per-test attribution data for one test
#[derive(Debug, Clone, Default)]
pub struct TestAttribution {
    pub hashes: CoveringHashes,
    /// Raw number of covered lines across all files, may be zero
    pub covered_lines: u64,
}

/// Attribution for every test of one commit, computed once up front
#[derive(Debug, Clone)]
pub struct Attribution {
    commit: CommitHash,
    commit_time: DateTime<Utc>,
    sequences: HashMap<CommitHash, u64>,
    times: HashMap<CommitHash, DateTime<Utc>>,
    tests: HashMap<TestId, TestAttribution>,
}

impl Attribution {
    pub fn compute(view: &CommitView) -> Self {
        let mut tests: HashMap<TestId, TestAttribution> = HashMap::with_capacity(view.tests().len());
        let mut sequences: HashMap<CommitHash, u64> = HashMap::new();
        let mut times: HashMap<CommitHash, DateTime<Utc>> = HashMap::new();

        for test in view.tests() {
            let hashes = covering_hashes(view, &test.id);
            let covered_lines = view
                .coverage_of(&test.id)
                .map_or(0, |c| c.values().map(|lines| lines.len() as u64).sum());

            for (hash, _) in hashes.iter() {
                if sequences.contains_key(hash) {
                    continue;
                }
                match view.history.get(hash) {
                    Some(record) => {
                        sequences.insert(hash.to_string(), record.sequence);
                        times.insert(hash.to_string(), record.timestamp);
                    }
                    None => warn!(
                        project = %view.project,
                        commit = %view.commit.hash,
                        owner = %hash,
                        "attributed hash has no commit record"
                    ),
                }
            }

            let newest_age = hashes
                .iter()
                .filter_map(|(hash, _)| times.get(hash))
                .max()
                .map(|&t| (view.commit.timestamp - t).num_hours());
            debug!(test = %test.id, covered_lines, owners = hashes.iter().count(), ?newest_age, "attributed test");
            tests.insert(test.id.clone(), TestAttribution { hashes, covered_lines });
        }

        Self {
            commit: view.commit.hash.clone(),
            commit_time: view.commit.timestamp,
            sequences,
            times,
            tests,
        }
    }

    pub fn hashes(&self, test: &str) -> Option<&CoveringHashes> {
        self.tests.get(test).map(|t| &t.hashes)
    }

    /// Total covered lines, with zero replaced by one so ratios stay defined.
    pub fn covered_line_count(&self, test: &str) -> u64 {
        self.tests.get(test).map_or(0, |t| t.covered_lines).max(1)
    }

    /// How many of the test's covered lines the commit under test produced
    pub fn latest_commit_count(&self, test: &str) -> u64 {
        self.hashes(test).map_or(0, |h| h.count(&self.commit))
    }

    /// Sum over owning commits of (sequence distance from the test's most
    /// recent owner) times line count. Owners with no commit record are
    /// left out.
    pub fn ahead_count(&self, test: &str) -> u64 {
        let Some(hashes) = self.hashes(test) else {
            return 0;
        };
        let known: Vec<(u64, u64)> = hashes
            .iter()
            .filter_map(|(hash, n)| self.sequences.get(hash).map(|&seq| (seq, n)))
            .collect();
        let Some(min_seq) = known.iter().map(|&(seq, _)| seq).min() else {
            return 0;
        };
        known.iter().map(|&(seq, n)| (seq - min_seq) * n).sum()
    }

    /// Time between an owning commit and the commit under test
    pub fn commit_age(&self, hash: &str) -> Option<Duration> {
        self.times.get(hash).map(|&t| self.commit_time - t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn lines(ls: &[u32]) -> LineSet {
        ls.iter().copied().collect()
    }

    fn blame(owners: &[&str]) -> Blame {
        owners.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unchanged_file_matches_blame_counts() {
        let b = blame(&["x", "y", "x", "z"]);
        let hashes = file_covering_hashes("c", &b, &[], &lines(&[1, 3, 4]));
        let expected: CoveringHashes = [("x", 2), ("z", 1)].into_iter().collect();
        assert_eq!(hashes, expected);
    }

    #[test]
    fn insertion_between_covered_lines_credits_commit() {
        let b = blame(&["x", "x", "x", "x"]);
        let hunks = [Hunk::new(2, 0, 3, 5)];
        let hashes = file_covering_hashes("c", &b, &hunks, &lines(&[2, 3]));
        assert_eq!(hashes.count("c"), 5);
        assert_eq!(hashes.count("x"), 2);
    }

    #[test]
    fn insertion_next_to_uncovered_line_credits_nothing() {
        let b = blame(&["x", "x", "x", "x"]);
        let hunks = [Hunk::new(2, 0, 3, 5)];
        assert_eq!(file_covering_hashes("c", &b, &hunks, &lines(&[2])).count("c"), 0);
        assert_eq!(file_covering_hashes("c", &b, &hunks, &lines(&[3])).count("c"), 0);
    }

    #[test]
    fn insertion_at_file_edges_treats_outside_as_covered() {
        let b = blame(&["x", "x"]);
        let at_start = [Hunk::new(0, 0, 1, 2)];
        assert_eq!(file_covering_hashes("c", &b, &at_start, &lines(&[1])).count("c"), 2);

        let at_end = [Hunk::new(2, 0, 3, 4)];
        assert_eq!(file_covering_hashes("c", &b, &at_end, &lines(&[2])).count("c"), 4);
    }

    #[test]
    fn modification_does_not_change_attribution() {
        let b = blame(&["x", "y", "z"]);
        let covered = lines(&[1, 2, 3]);
        let plain = file_covering_hashes("c", &b, &[], &covered);
        let modified = file_covering_hashes("c", &b, &[Hunk::new(2, 1, 2, 1), Hunk::new(3, 1, 3, 0)], &covered);
        assert_eq!(plain, modified);
        assert_eq!(modified.count("c"), 0);
    }

    #[test]
    fn lines_outside_blame_are_skipped() {
        let b = blame(&["x"]);
        let hashes = file_covering_hashes("c", &b, &[], &lines(&[0, 1, 7]));
        assert_eq!(hashes.total(), 1);
        assert_eq!(hashes.count("x"), 1);
    }

    fn record(hash: &str, sequence: u64) -> CommitRecord {
        CommitRecord {
            hash: hash.to_string(),
            parent: None,
            timestamp: chrono::Utc.timestamp_opt(1_700_000_000 - sequence as i64 * 3600, 0).unwrap(),
            sequence,
            added_loc: 0,
            deleted_loc: 0,
        }
    }

    fn view() -> CommitView {
        let history: History = [record("c", 0), record("p", 1), record("old", 4)]
            .into_iter()
            .map(|r| (r.hash.clone(), r))
            .collect();
        let mut facts = CommitFacts::default();
        facts.blames.insert("f".into(), blame(&["p", "p", "old", "old", "ghost"]));
        facts.blames.insert("g".into(), blame(&["old"]));
        facts.hunks.insert("f".into(), vec![Hunk::new(2, 0, 3, 2)]);
        facts.tests = vec![
            TestResult { id: "a".into(), passed: false, duration: 1.0, line: 10 },
            TestResult { id: "b".into(), passed: true, duration: 1.0, line: 20 },
            TestResult { id: "empty".into(), passed: true, duration: 1.0, line: 30 },
        ];
        let mut a = FileCoverage::new();
        a.insert("f".into(), lines(&[1, 2, 3, 5]));
        a.insert("g".into(), lines(&[1]));
        a.insert("missing".into(), lines(&[1]));
        facts.coverage.insert("a".into(), a);
        let mut b = FileCoverage::new();
        b.insert("f".into(), lines(&[4]));
        facts.coverage.insert("b".into(), b);

        CommitView {
            project: "proj".into(),
            commit: record("c", 0),
            history: Arc::new(history),
            facts,
        }
    }

    #[test]
    fn merges_files_and_skips_unblamed() {
        let view = view();
        let hashes = covering_hashes(&view, "a");
        assert_eq!(hashes.count("c"), 2);
        assert_eq!(hashes.count("p"), 2);
        assert_eq!(hashes.count("old"), 2);
        assert_eq!(hashes.count("ghost"), 1);
        assert!(covering_hashes(&view, "nobody").is_empty());
    }

    #[test]
    fn derived_accessors() {
        let view = view();
        let attr = Attribution::compute(&view);

        // f: 4 lines, g: 1 line, "missing" still counts toward coverage size
        assert_eq!(attr.covered_line_count("a"), 6);
        assert_eq!(attr.covered_line_count("empty"), 1);
        assert_eq!(attr.latest_commit_count("a"), 2);
        assert_eq!(attr.latest_commit_count("b"), 0);

        // min seq 0 (c); p: 1*2, old: 4*2, ghost excluded
        assert_eq!(attr.ahead_count("a"), 10);
        // single owner is its own minimum
        assert_eq!(attr.ahead_count("b"), 0);
        assert_eq!(attr.ahead_count("empty"), 0);

        assert_eq!(attr.commit_age("old"), Some(Duration::hours(4)));
        assert_eq!(attr.commit_age("ghost"), None);
    }
}
