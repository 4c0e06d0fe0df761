//! Configuration management with environment variable support.
//!
//! This module provides centralized configuration for Web Pilot, supporting:
//! - Environment variables for all configurable values
//! - Sensible defaults matching the executor service's usual deployment
//! - Explicit `defaults()` constructors for tests that must ignore the
//!   environment
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `WEB_PILOT_EXECUTOR_URL` | Playwright executor service base URL | `http://localhost:8000` |
//! | `WEB_PILOT_OUTPUT_DIR` | Directory for run artifacts | `output` |
//! | `WEB_PILOT_TIMEOUT` | Per-attempt execute timeout (seconds) | `300.0` |
//! | `WEB_PILOT_MAX_RETRIES` | Extra execute attempts after the first | `1` |
//! | `WEB_PILOT_LLM_PROVIDER` | LLM provider (`anthropic` or `openai`) | `anthropic` |
//! | `WEB_PILOT_ANTHROPIC_URL` | Anthropic API base URL | `https://api.anthropic.com/v1` |
//! | `WEB_PILOT_ANTHROPIC_MODEL` | Anthropic model name | `claude-3-5-sonnet-latest` |
//! | `WEB_PILOT_OPENAI_URL` | OpenAI API base URL | `https://api.openai.com/v1` |
//! | `WEB_PILOT_OPENAI_MODEL` | OpenAI model name | `gpt-4o` |
//! | `WEB_PILOT_LLM_MAX_TOKENS` | Max tokens in LLM responses | `4096` |
//! | `WEB_PILOT_LLM_TIMEOUT` | LLM request timeout (seconds) | `120` |
//! | `ANTHROPIC_API_KEY` | Anthropic API key | *(empty)* |
//! | `OPENAI_API_KEY` | OpenAI API key | *(empty)* |
//!
//! # Example
//!
//! ```bash
//! # Point at a remote executor and keep artifacts elsewhere
//! export WEB_PILOT_EXECUTOR_URL="http://playwright.internal:8000"
//! export WEB_PILOT_OUTPUT_DIR="/var/tmp/web-pilot"
//! ```

use std::env;
use std::sync::OnceLock;

// ============================================================================
// Default Values
// ============================================================================

/// Default executor service base URL
pub const DEFAULT_EXECUTOR_URL: &str = "http://localhost:8000";

/// Default output directory for run artifacts
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Default per-attempt execute timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: f64 = 300.0;

/// Default maximum retry count (extra attempts after the first)
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Default LLM provider selector
pub const DEFAULT_LLM_PROVIDER: &str = "anthropic";

/// Default Anthropic API base URL
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com/v1";

/// Default Anthropic model
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-latest";

/// Default OpenAI API base URL
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default OpenAI model
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Default max tokens for LLM responses
pub const DEFAULT_LLM_MAX_TOKENS: u32 = 4096;

/// Default LLM request timeout (seconds)
pub const DEFAULT_LLM_TIMEOUT: u64 = 120;

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the executor service base URL
pub const ENV_EXECUTOR_URL: &str = "WEB_PILOT_EXECUTOR_URL";

/// Environment variable for the output directory
pub const ENV_OUTPUT_DIR: &str = "WEB_PILOT_OUTPUT_DIR";

/// Environment variable for the execute timeout
pub const ENV_TIMEOUT: &str = "WEB_PILOT_TIMEOUT";

/// Environment variable for the maximum retry count
pub const ENV_MAX_RETRIES: &str = "WEB_PILOT_MAX_RETRIES";

/// Environment variable for the LLM provider selector
pub const ENV_LLM_PROVIDER: &str = "WEB_PILOT_LLM_PROVIDER";

/// Environment variable for the Anthropic API base URL
pub const ENV_ANTHROPIC_URL: &str = "WEB_PILOT_ANTHROPIC_URL";

/// Environment variable for the Anthropic model name
pub const ENV_ANTHROPIC_MODEL: &str = "WEB_PILOT_ANTHROPIC_MODEL";

/// Environment variable for the OpenAI API base URL
pub const ENV_OPENAI_URL: &str = "WEB_PILOT_OPENAI_URL";

/// Environment variable for the OpenAI model name
pub const ENV_OPENAI_MODEL: &str = "WEB_PILOT_OPENAI_MODEL";

/// Environment variable for LLM max tokens
pub const ENV_LLM_MAX_TOKENS: &str = "WEB_PILOT_LLM_MAX_TOKENS";

/// Environment variable for the LLM request timeout
pub const ENV_LLM_TIMEOUT: &str = "WEB_PILOT_LLM_TIMEOUT";

/// Environment variable for the Anthropic API key
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";

/// Environment variable for the OpenAI API key
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized configuration for Web Pilot
#[derive(Debug, Clone)]
pub struct Config {
    /// Executor service settings
    pub executor: ExecutorSettings,
    /// LLM provider settings
    pub llm: LlmSettings,
    /// Artifact output settings
    pub output: OutputSettings,
}

/// Executor-service-related settings
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Base URL of the Playwright executor service
    pub base_url: String,
    /// Per-attempt execute timeout (seconds)
    pub timeout_secs: f64,
    /// Maximum retry count (extra attempts after the first)
    pub max_retries: u32,
}

/// LLM-related settings
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Provider selector string (`anthropic` or `openai`)
    pub provider: String,
    /// Anthropic API base URL
    pub anthropic_url: String,
    /// Anthropic model name
    pub anthropic_model: String,
    /// Anthropic API key
    pub anthropic_api_key: String,
    /// OpenAI API base URL
    pub openai_url: String,
    /// OpenAI model name
    pub openai_model: String,
    /// OpenAI API key
    pub openai_api_key: String,
    /// Maximum tokens in responses
    pub max_tokens: u32,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

/// Artifact output settings
#[derive(Debug, Clone)]
pub struct OutputSettings {
    /// Directory for run artifacts (plan, results, analysis)
    pub dir: String,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            executor: ExecutorSettings::from_env(),
            llm: LlmSettings::from_env(),
            output: OutputSettings::from_env(),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            executor: ExecutorSettings::defaults(),
            llm: LlmSettings::defaults(),
            output: OutputSettings::defaults(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ExecutorSettings {
    /// Create executor settings from environment variables
    pub fn from_env() -> Self {
        Self {
            base_url: env::var(ENV_EXECUTOR_URL)
                .unwrap_or_else(|_| DEFAULT_EXECUTOR_URL.to_string()),
            timeout_secs: env::var(ENV_TIMEOUT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            max_retries: env::var(ENV_MAX_RETRIES)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_RETRIES),
        }
    }

    /// Create executor settings with defaults
    pub fn defaults() -> Self {
        Self {
            base_url: DEFAULT_EXECUTOR_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl LlmSettings {
    /// Create LLM settings from environment variables
    pub fn from_env() -> Self {
        Self {
            provider: env::var(ENV_LLM_PROVIDER)
                .unwrap_or_else(|_| DEFAULT_LLM_PROVIDER.to_string()),
            anthropic_url: env::var(ENV_ANTHROPIC_URL)
                .unwrap_or_else(|_| DEFAULT_ANTHROPIC_URL.to_string()),
            anthropic_model: env::var(ENV_ANTHROPIC_MODEL)
                .unwrap_or_else(|_| DEFAULT_ANTHROPIC_MODEL.to_string()),
            anthropic_api_key: env::var(ENV_ANTHROPIC_API_KEY).unwrap_or_default(),
            openai_url: env::var(ENV_OPENAI_URL)
                .unwrap_or_else(|_| DEFAULT_OPENAI_URL.to_string()),
            openai_model: env::var(ENV_OPENAI_MODEL)
                .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string()),
            openai_api_key: env::var(ENV_OPENAI_API_KEY).unwrap_or_default(),
            max_tokens: env::var(ENV_LLM_MAX_TOKENS)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_LLM_MAX_TOKENS),
            timeout_secs: env::var(ENV_LLM_TIMEOUT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_LLM_TIMEOUT),
        }
    }

    /// Create LLM settings with defaults
    pub fn defaults() -> Self {
        Self {
            provider: DEFAULT_LLM_PROVIDER.to_string(),
            anthropic_url: DEFAULT_ANTHROPIC_URL.to_string(),
            anthropic_model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            anthropic_api_key: String::new(),
            openai_url: DEFAULT_OPENAI_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_api_key: String::new(),
            max_tokens: DEFAULT_LLM_MAX_TOKENS,
            timeout_secs: DEFAULT_LLM_TIMEOUT,
        }
    }
}

impl OutputSettings {
    /// Create output settings from environment variables
    pub fn from_env() -> Self {
        Self {
            dir: env::var(ENV_OUTPUT_DIR).unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.to_string()),
        }
    }

    /// Create output settings with defaults
    pub fn defaults() -> Self {
        Self {
            dir: DEFAULT_OUTPUT_DIR.to_string(),
        }
    }
}

/// Get the executor base URL (convenience function)
pub fn executor_url() -> String {
    get().executor.base_url.clone()
}

/// Get the output directory (convenience function)
pub fn output_dir() -> String {
    get().output.dir.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert_eq!(config.executor.base_url, DEFAULT_EXECUTOR_URL);
        assert_eq!(config.executor.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.executor.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.output.dir, DEFAULT_OUTPUT_DIR);
        assert_eq!(config.llm.provider, DEFAULT_LLM_PROVIDER);
    }

    #[test]
    fn test_llm_defaults() {
        let llm = LlmSettings::defaults();
        assert_eq!(llm.anthropic_url, DEFAULT_ANTHROPIC_URL);
        assert_eq!(llm.openai_model, DEFAULT_OPENAI_MODEL);
        assert!(llm.anthropic_api_key.is_empty());
        assert_eq!(llm.max_tokens, DEFAULT_LLM_MAX_TOKENS);
    }
}
