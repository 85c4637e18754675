// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Errors reading facts from a store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown project `{0}`")]
    UnknownProject(String),

    #[error("no commit `{commit}` in project `{project}`")]
    UnknownCommit { project: String, commit: String },

    #[error("no facts recorded for commit `{commit}` in project `{project}`")]
    MissingFacts { project: String, commit: String },
}

/// Errors scoring an ordering
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricError {
    #[error("ordering contains no failing test")]
    NoFailures,

    #[error("ordering has zero total duration")]
    ZeroDuration,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Metric(#[from] MetricError),

    #[error("failed to write report to {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
