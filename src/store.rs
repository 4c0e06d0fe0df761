//! Persistence for run artifacts.
//!
//! A run leaves three artifacts in the output directory: the generated
//! plan (`plan.json`), the raw execution results (`results.json`), and the
//! narrative analysis (`analysis.md`). The plan is written once per run
//! and overwritten unconditionally on rerun; concurrent runs must use
//! distinct output directories to avoid clobbering it.

use chrono::Utc;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed filename for the persisted plan
pub const PLAN_FILENAME: &str = "plan.json";

/// Fixed filename for the persisted execution results
pub const RESULTS_FILENAME: &str = "results.json";

/// Fixed filename for the persisted analysis
pub const ANALYSIS_FILENAME: &str = "analysis.md";

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while persisting or loading artifacts
#[derive(Debug)]
pub enum StoreError {
    /// I/O error
    Io(std::io::Error),

    /// Serialization error
    Serialization(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "Failed to persist artifact: {}", err),
            StoreError::Serialization(err) => {
                write!(f, "Failed to serialize artifact: {}", err)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Serialization(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err)
    }
}

/// Store rooted at one output directory
#[derive(Debug, Clone)]
pub struct PlanStore {
    dir: PathBuf,
}

impl PlanStore {
    /// Create a store rooted at the given directory. Nothing is created
    /// on disk until the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The output directory this store writes into
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the persisted plan
    pub fn plan_path(&self) -> PathBuf {
        self.dir.join(PLAN_FILENAME)
    }

    /// Path of the persisted execution results
    pub fn results_path(&self) -> PathBuf {
        self.dir.join(RESULTS_FILENAME)
    }

    /// Path of the persisted analysis
    pub fn analysis_path(&self) -> PathBuf {
        self.dir.join(ANALYSIS_FILENAME)
    }

    /// Persist the plan as pretty-printed JSON, creating intermediate
    /// directories as needed and overwriting any existing artifact
    pub fn save_plan(&self, plan: &Value) -> StoreResult<PathBuf> {
        self.write_json(self.plan_path(), plan)
    }

    /// Reload the persisted plan.
    ///
    /// Round-trips structurally equal data for any value previously
    /// written by [`save_plan`](Self::save_plan) in the same run.
    pub fn load_plan(&self) -> StoreResult<Value> {
        let contents = fs::read_to_string(self.plan_path())?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Persist the raw execution results as pretty-printed JSON
    pub fn save_results(&self, results: &Value) -> StoreResult<PathBuf> {
        self.write_json(self.results_path(), results)
    }

    /// Persist the analysis as markdown with a generation timestamp
    pub fn save_analysis(&self, analysis: &str) -> StoreResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.analysis_path();
        let contents = format!(
            "# Test Analysis\n\nGenerated: {}\n\n{}\n",
            Utc::now().to_rfc3339(),
            analysis
        );
        fs::write(&path, contents)?;
        Ok(path)
    }

    fn write_json(&self, path: PathBuf, value: &Value) -> StoreResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let contents = serde_json::to_string_pretty(value)?;
        fs::write(&path, contents)?;
        Ok(path)
    }
}
