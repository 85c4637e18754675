// src/lib.rs

//! Ranks a commit's test suite by several heuristics and scores each
//! ordering by how early, in run time, it surfaces the failing tests.
//!
//! Line-level facts for a commit (blame, diff hunks, per-test coverage)
//! are read from a [`store::FactStore`]; [`attribution`] credits each
//! test's covered lines to the commits that produced them, [`strategy`]
//! orders the tests, and [`metric`] scores the ordering.

pub mod attribution;
pub mod cli;
pub mod error;
pub mod evaluate;
pub mod metric;
pub mod model;
pub mod report;
pub mod store;
pub mod strategy;

pub use error::{Error, Result};
