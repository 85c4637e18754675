//! Property tests for orderings and the fault detection score.

use chrono::TimeZone;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use test_prio::metric::score;
use test_prio::model::*;
use test_prio::strategy::Ranker;

const OWNERS: [&str; 4] = ["head", "one", "two", "three"];
const FILE_LEN: u32 = 20;

fn record(hash: &str, sequence: u64) -> CommitRecord {
    CommitRecord {
        hash: hash.to_string(),
        parent: None,
        timestamp: chrono::Utc.timestamp_opt(1_600_000_000 - sequence as i64 * 60, 0).unwrap(),
        sequence,
        added_loc: 0,
        deleted_loc: 0,
    }
}

fn arb_test() -> impl Strategy<Value = (bool, f64, u32, Vec<u32>)> {
    (
        any::<bool>(),
        0.1f64..10.0,
        1u32..200,
        prop::collection::vec(1u32..=FILE_LEN, 0..12),
    )
}

fn arb_view() -> impl Strategy<Value = CommitView> {
    (
        prop::collection::vec(0usize..OWNERS.len(), FILE_LEN as usize),
        prop::collection::vec((0u32..=FILE_LEN, 1u32..4), 0..3),
        prop::collection::vec(arb_test(), 1..8),
    )
        .prop_map(|(blame, insertions, tests)| {
            let history: History = OWNERS
                .iter()
                .enumerate()
                .map(|(i, h)| (h.to_string(), record(h, i as u64 * 2)))
                .collect();
            let mut facts = CommitFacts::default();
            facts.blames.insert("f".into(), blame.iter().map(|&i| OWNERS[i].to_string()).collect());
            facts.hunks.insert(
                "f".into(),
                insertions.iter().map(|&(at, n)| Hunk::new(at, 0, at + 1, n)).collect(),
            );
            for (i, (passed, duration, line, covered)) in tests.into_iter().enumerate() {
                let id = format!("t{i}");
                let mut cov = FileCoverage::new();
                cov.insert("f".into(), covered.into_iter().collect());
                facts.coverage.insert(id.clone(), cov);
                facts.tests.push(TestResult { id, passed, duration, line });
            }
            CommitView {
                project: "prop".into(),
                commit: record("head", 0),
                history: Arc::new(history),
                facts,
            }
        })
}

fn ids(tests: &[&TestResult]) -> Vec<String> {
    tests.iter().map(|t| t.id.clone()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_every_strategy_permutes_the_suite(view in arb_view(), seed in any::<u64>()) {
        let ranker = Ranker::new(&view);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut expected = ids(&view.tests().iter().collect::<Vec<_>>());
        expected.sort();

        for strategy in test_prio::strategy::Strategy::ALL {
            let mut got = ids(&ranker.rank(strategy, &mut rng));
            got.sort();
            prop_assert_eq!(got, expected.clone());
        }
    }

    #[test]
    fn prop_orderings_are_deterministic(view in arb_view()) {
        let first = Ranker::new(&view);
        let second = Ranker::new(&view);
        for strategy in test_prio::strategy::Strategy::ALL {
            if strategy == test_prio::strategy::Strategy::Random {
                continue;
            }
            let a = ids(&first.rank(strategy, &mut StdRng::seed_from_u64(1)));
            let b = ids(&second.rank(strategy, &mut StdRng::seed_from_u64(2)));
            prop_assert_eq!(a, b);
        }
    }

    #[test]
    fn prop_score_is_bounded_when_a_test_fails(view in arb_view(), seed in any::<u64>()) {
        prop_assume!(view.has_failure());
        let ranker = Ranker::new(&view);
        let mut rng = StdRng::seed_from_u64(seed);
        for strategy in test_prio::strategy::Strategy::ALL {
            let s = score(ranker.rank(strategy, &mut rng).iter().copied()).unwrap();
            prop_assert!(s >= 0.0);
            prop_assert!(s <= 100.0 + 1e-9);
        }
    }

    #[test]
    fn prop_failure_first_beats_failure_last(
        fail_duration in 0.1f64..10.0,
        passes in prop::collection::vec(0.1f64..10.0, 1..6),
    ) {
        let fail = TestResult { id: "f".into(), passed: false, duration: fail_duration, line: 1 };
        let passing: Vec<TestResult> = passes
            .iter()
            .enumerate()
            .map(|(i, &d)| TestResult { id: format!("p{i}"), passed: true, duration: d, line: 1 })
            .collect();

        let first: Vec<&TestResult> = std::iter::once(&fail).chain(passing.iter()).collect();
        let last: Vec<&TestResult> = passing.iter().chain(std::iter::once(&fail)).collect();
        let a = score(first.iter().copied()).unwrap();
        let b = score(last.iter().copied()).unwrap();
        prop_assert!(a > b);
        prop_assert!(b >= 0.0);
    }
}
