// src/store.rs

use crate::error::StoreError;
use crate::model::*;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Read access to extracted facts, keyed by project and commit.
///
/// Implementations must hand back blame, tests and coverage computed
/// against one tree state per commit.
pub trait FactStore: Sync {
    fn projects(&self) -> Result<Vec<Project>, StoreError>;

    fn commits(&self, project: &str) -> Result<Vec<CommitRecord>, StoreError>;

    fn facts(&self, project: &str, commit: &str) -> Result<CommitFacts, StoreError>;

    /// The project's commit records keyed by hash
    fn history(&self, project: &str) -> Result<History, StoreError> {
        Ok(self
            .commits(project)?
            .into_iter()
            .map(|c| (c.hash.clone(), c))
            .collect())
    }
}

/// Loads the view of one commit, fetching the project history as well.
pub fn load_commit_view(
    store: &dyn FactStore,
    project: &str,
    commit: &str,
) -> Result<CommitView, StoreError> {
    let history = Arc::new(store.history(project)?);
    load_commit_view_with(store, project, history, commit)
}

/// Loads the view of one commit against an already-fetched history.
pub fn load_commit_view_with(
    store: &dyn FactStore,
    project: &str,
    history: Arc<History>,
    commit: &str,
) -> Result<CommitView, StoreError> {
    let record = history
        .get(commit)
        .cloned()
        .ok_or_else(|| StoreError::UnknownCommit {
            project: project.to_string(),
            commit: commit.to_string(),
        })?;
    let facts = store.facts(project, commit)?;

    Ok(CommitView {
        project: project.to_string(),
        commit: record,
        history,
        facts,
    })
}

/// Facts held in memory, for embedding and tests
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    projects: Vec<Project>,
    commits: HashMap<String, Vec<CommitRecord>>,
    facts: HashMap<(String, CommitHash), CommitFacts>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_project(&mut self, project: Project) {
        self.commits.entry(project.id.clone()).or_default();
        self.projects.push(project);
    }

    pub fn add_commit(&mut self, project: &str, commit: CommitRecord, facts: Option<CommitFacts>) {
        if let Some(facts) = facts {
            self.facts.insert((project.to_string(), commit.hash.clone()), facts);
        }
        self.commits.entry(project.to_string()).or_default().push(commit);
    }
}

impl FactStore for MemoryStore {
    fn projects(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.projects.clone())
    }

    fn commits(&self, project: &str) -> Result<Vec<CommitRecord>, StoreError> {
        self.commits
            .get(project)
            .cloned()
            .ok_or_else(|| StoreError::UnknownProject(project.to_string()))
    }

    fn facts(&self, project: &str, commit: &str) -> Result<CommitFacts, StoreError> {
        self.facts
            .get(&(project.to_string(), commit.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::MissingFacts {
                project: project.to_string(),
                commit: commit.to_string(),
            })
    }
}

/// Facts laid out as JSON documents under a root directory:
///
/// ```text
/// <root>/projects.json
/// <root>/<project>/commits.json
/// <root>/<project>/facts/<hash>.json
/// ```
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn project_dir(&self, project: &str) -> PathBuf {
        self.root.join(project)
    }

    fn facts_path(&self, project: &str, commit: &str) -> PathBuf {
        self.project_dir(project).join("facts").join(format!("{commit}.json"))
    }
}

impl FactStore for JsonStore {
    fn projects(&self) -> Result<Vec<Project>, StoreError> {
        read_json(&self.root.join("projects.json"))
    }

    fn commits(&self, project: &str) -> Result<Vec<CommitRecord>, StoreError> {
        let dir = self.project_dir(project);
        if !dir.is_dir() {
            return Err(StoreError::UnknownProject(project.to_string()));
        }
        read_json(&dir.join("commits.json"))
    }

    fn facts(&self, project: &str, commit: &str) -> Result<CommitFacts, StoreError> {
        let path = self.facts_path(project, commit);
        if !path.is_file() {
            return Err(StoreError::MissingFacts {
                project: project.to_string(),
                commit: commit.to_string(),
            });
        }
        read_json(&path)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let text = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}
