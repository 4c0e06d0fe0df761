//! Web Pilot - LLM-directed website testing against a Playwright executor service.
//!
//! This crate provides:
//! - Page content fetching through the executor service's navigate endpoint
//! - LLM-driven test plan generation (Anthropic or OpenAI)
//! - Structural plan validation and artifact persistence
//! - Plan execution with bounded retries and typed error classification
//! - LLM-driven result analysis
//!
//! # Example
//!
//! ```rust,no_run
//! use web_pilot::runner::{RunConfig, run_test};
//!
//! # async fn demo() {
//! let config = RunConfig::new("https://example.com", "the login form accepts valid credentials")
//!     .executor_url("http://localhost:8000")
//!     .max_retries(2);
//!
//! let outcome = run_test(&config).await;
//! println!("{}", serde_json::to_string_pretty(&outcome).unwrap());
//! # }
//! ```

pub mod browser;
pub mod config;
pub mod llm;
pub mod plan;
pub mod planner;
pub mod runner;
pub mod store;

// Re-export the plan data model
pub use plan::{Action, PlanDocument, Step, TestPlan, ValidationError, validate};

// Re-export the service client
pub use browser::{BrowserClient, ExecuteError, FetchError};

// Re-export LLM client types
pub use llm::{AnthropicClient, LlmClient, LlmError, LlmResult, OpenAiClient, Provider, client_for};

// Re-export generation and analysis
pub use planner::{
    AnalyzeError, GenerateError, analyze_results, build_analysis_prompt, build_plan_prompt,
    generate_plan,
};

// Re-export persistence
pub use store::{PlanStore, StoreError, StoreResult};

// Re-export the orchestrator
pub use runner::{RunConfig, RunError, RunOutcome, RunProgress, run_test, run_test_with_progress};
