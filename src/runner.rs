//! End-to-end run orchestration.
//!
//! Sequences the pipeline (fetch page source, generate a plan, validate
//! it, persist it, execute it, analyze the results) under one shared
//! HTTP client that is released on every exit path. Every domain error is
//! converted into the uniform [`RunOutcome`] envelope here; nothing below
//! this layer is user-visible.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

use crate::browser::{BrowserClient, ExecuteError, FetchError};
use crate::config::{self, LlmSettings};
use crate::llm::{self, Provider};
use crate::plan::{self, ValidationError};
use crate::planner::{self, AnalyzeError, GenerateError};
use crate::store::{PlanStore, StoreError};

/// Configuration for one end-to-end run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// The website under test
    pub target_url: String,
    /// Natural-language description of what to test
    pub requirement: String,
    /// Executor service base URL
    pub executor_url: String,
    /// Directory for run artifacts
    pub output_dir: PathBuf,
    /// Per-attempt execute timeout
    pub timeout: Duration,
    /// Extra execute attempts after the first
    pub max_retries: u32,
    /// Which LLM provider generates and analyzes
    pub provider: Provider,
    /// Provider endpoints, models, and keys
    pub llm: LlmSettings,
}

impl RunConfig {
    /// Create a run configuration with defaults taken from the process
    /// configuration (environment variables or built-in defaults)
    pub fn new(target_url: impl Into<String>, requirement: impl Into<String>) -> Self {
        let cfg = config::get();
        Self {
            target_url: target_url.into(),
            requirement: requirement.into(),
            executor_url: cfg.executor.base_url.clone(),
            output_dir: PathBuf::from(&cfg.output.dir),
            timeout: Duration::from_secs_f64(cfg.executor.timeout_secs),
            max_retries: cfg.executor.max_retries,
            provider: Provider::from_selector(&cfg.llm.provider),
            llm: cfg.llm.clone(),
        }
    }

    /// Set the executor service base URL
    pub fn executor_url(mut self, url: impl Into<String>) -> Self {
        self.executor_url = url.into();
        self
    }

    /// Set the output directory
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the per-attempt execute timeout in seconds
    pub fn timeout_secs(mut self, secs: f64) -> Self {
        self.timeout = Duration::from_secs_f64(secs);
        self
    }

    /// Set the retry budget
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    /// Set the LLM provider settings
    pub fn llm_settings(mut self, llm: LlmSettings) -> Self {
        self.llm = llm;
        self
    }
}

/// Progress update during a run
#[derive(Debug, Clone)]
pub enum RunProgress {
    /// Fetching the target page's content
    Fetching {
        /// The page being fetched
        url: String,
    },
    /// Waiting on the LLM to produce a plan
    Generating,
    /// Plan validated and written to disk
    PlanSaved {
        /// Where the plan landed
        path: PathBuf,
    },
    /// Plan submitted to the executor service
    Executing,
    /// Waiting on the LLM to summarize the results
    Analyzing,
    /// Run finished successfully
    Complete,
}

/// Uniform result envelope for one run: the full artifact set on success,
/// a single error message on failure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunOutcome {
    /// The pipeline ran to completion
    Success {
        /// The generated plan, as sent to the executor
        test_plan: Value,
        /// The executor service's result payload
        results: Value,
        /// The LLM's narrative summary
        analysis: String,
    },
    /// The pipeline stopped at some stage
    Failure {
        /// Human-readable failure description with diagnostic detail
        error: String,
    },
}

impl RunOutcome {
    /// Whether the run completed successfully
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }

    /// The failure message, if any
    pub fn error(&self) -> Option<&str> {
        match self {
            RunOutcome::Success { .. } => None,
            RunOutcome::Failure { error } => Some(error),
        }
    }
}

impl From<RunError> for RunOutcome {
    fn from(err: RunError) -> Self {
        RunOutcome::Failure {
            error: err.to_string(),
        }
    }
}

/// Everything that can stop a run
#[derive(Debug)]
pub enum RunError {
    /// Page content could not be fetched
    Fetch(FetchError),
    /// The LLM did not produce a parseable plan
    Generate(GenerateError),
    /// The plan failed structural validation
    Validation(ValidationError),
    /// An artifact could not be persisted
    Store(StoreError),
    /// The executor service did not accept or complete the plan
    Execute(ExecuteError),
    /// The results could not be summarized
    Analyze(AnalyzeError),
    /// Anything outside the domain taxonomy
    Unexpected(String),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Fetch(err) => write!(f, "{}", err),
            RunError::Generate(err) => write!(f, "{}", err),
            RunError::Validation(err) => write!(f, "{}", err),
            RunError::Store(err) => write!(f, "{}", err),
            RunError::Execute(err) => write!(f, "{}", err),
            RunError::Analyze(err) => write!(f, "{}", err),
            RunError::Unexpected(msg) => write!(f, "Unexpected error: {}", msg),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Fetch(err) => Some(err),
            RunError::Generate(err) => Some(err),
            RunError::Validation(err) => Some(err),
            RunError::Store(err) => Some(err),
            RunError::Execute(err) => Some(err),
            RunError::Analyze(err) => Some(err),
            RunError::Unexpected(_) => None,
        }
    }
}

impl From<FetchError> for RunError {
    fn from(err: FetchError) -> Self {
        RunError::Fetch(err)
    }
}

impl From<GenerateError> for RunError {
    fn from(err: GenerateError) -> Self {
        RunError::Generate(err)
    }
}

impl From<ValidationError> for RunError {
    fn from(err: ValidationError) -> Self {
        RunError::Validation(err)
    }
}

impl From<StoreError> for RunError {
    fn from(err: StoreError) -> Self {
        RunError::Store(err)
    }
}

impl From<ExecuteError> for RunError {
    fn from(err: ExecuteError) -> Self {
        RunError::Execute(err)
    }
}

impl From<AnalyzeError> for RunError {
    fn from(err: AnalyzeError) -> Self {
        RunError::Analyze(err)
    }
}

/// Run the full pipeline for one website test
pub async fn run_test(config: &RunConfig) -> RunOutcome {
    run_test_with_progress(config, |_| {}).await
}

/// Run the full pipeline, reporting stage transitions through `on_progress`
pub async fn run_test_with_progress<F>(config: &RunConfig, mut on_progress: F) -> RunOutcome
where
    F: FnMut(RunProgress),
{
    match run_pipeline(config, &mut on_progress).await {
        Ok(outcome) => outcome,
        Err(err) => RunOutcome::from(err),
    }
}

async fn run_pipeline<F>(config: &RunConfig, on_progress: &mut F) -> Result<RunOutcome, RunError>
where
    F: FnMut(RunProgress),
{
    // One HTTP client for the whole run, shared by the executor and LLM
    // calls and dropped on every exit path.
    let http = Client::builder()
        .build()
        .map_err(|err| RunError::Unexpected(err.to_string()))?;

    let browser = BrowserClient::new(http.clone(), &config.executor_url);

    on_progress(RunProgress::Fetching {
        url: config.target_url.clone(),
    });
    let page_source = browser.fetch_page_source(&config.target_url).await?;

    let llm = llm::client_for(config.provider, http, &config.llm);

    on_progress(RunProgress::Generating);
    let test_plan = planner::generate_plan(
        llm.as_ref(),
        &config.target_url,
        &page_source,
        &config.requirement,
    )
    .await?;

    plan::validate(&test_plan)?;

    let store = PlanStore::new(&config.output_dir);
    let plan_path = store.save_plan(&test_plan)?;
    on_progress(RunProgress::PlanSaved { path: plan_path });

    on_progress(RunProgress::Executing);
    let results = browser
        .execute_plan(&test_plan, config.max_retries, config.timeout)
        .await?;
    store.save_results(&results)?;

    on_progress(RunProgress::Analyzing);
    let analysis = planner::analyze_results(llm.as_ref(), &results).await?;
    store.save_analysis(&analysis)?;

    on_progress(RunProgress::Complete);
    Ok(RunOutcome::Success {
        test_plan,
        results,
        analysis,
    })
}
