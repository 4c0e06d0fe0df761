//! Client for the Playwright executor service.
//!
//! Provides the two service calls the pipeline needs:
//! - `fetch_page_source`: one navigation request with no retries; a fetch
//!   failure aborts the run
//! - `execute_plan`: plan submission with bounded retries and response
//!   classification (rejected / throttled / server error / timeout)
//!
//! The retry loop keeps one attempt counter shared across every retryable
//! failure class. `max_retries` bounds the attempts *after* the first, so
//! a call issues at most `max_retries + 1` requests. Retries are issued
//! immediately, with the identical payload each time: a 422 is retried
//! without mutating the request.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Errors that can occur while fetching page content
#[derive(Debug)]
pub enum FetchError {
    /// The navigation request could not be sent or completed
    Request(String),
    /// The service answered with a non-success status
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, kept for diagnostics
        detail: String,
    },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Request(msg) => write!(f, "Failed to fetch page source: {}", msg),
            FetchError::Status { status, detail } => {
                write!(f, "HTTP {} error fetching page source: {}", status, detail)
            }
        }
    }
}

impl std::error::Error for FetchError {}

/// Errors that can occur while executing a plan
#[derive(Debug)]
pub enum ExecuteError {
    /// 422 on every attempt: the service would not accept the plan payload
    Rejected {
        /// The service's error payload from the final attempt
        detail: String,
        /// Total requests issued
        attempts: u32,
    },
    /// Non-retryable client error (4xx other than 422 and 429)
    Client {
        /// HTTP status code
        status: u16,
        /// Response body, kept for diagnostics
        detail: String,
    },
    /// Throttled or server-side failure on every attempt
    RetriesExhausted {
        /// Status code from the final attempt
        status: u16,
        /// Response body from the final attempt
        detail: String,
        /// Total requests issued
        attempts: u32,
    },
    /// Every attempt timed out
    TimeoutExhausted {
        /// Total requests issued
        attempts: u32,
    },
    /// The request failed below the HTTP layer (connection refused, DNS)
    Transport(String),
    /// A success response carried a body that was not valid JSON
    InvalidBody(String),
}

impl std::fmt::Display for ExecuteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecuteError::Rejected { detail, attempts } => write!(
                f,
                "Executor service rejected the plan after {} attempts: {}",
                attempts, detail
            ),
            ExecuteError::Client { status, detail } => {
                write!(f, "HTTP {} error: {}", status, detail)
            }
            ExecuteError::RetriesExhausted {
                status,
                detail,
                attempts,
            } => write!(
                f,
                "Failed after {} attempts: HTTP {}: {}",
                attempts, status, detail
            ),
            ExecuteError::TimeoutExhausted { attempts } => {
                write!(f, "Execute request timed out after {} attempts", attempts)
            }
            ExecuteError::Transport(msg) => write!(f, "Execute request failed: {}", msg),
            ExecuteError::InvalidBody(msg) => {
                write!(f, "Invalid execute response body: {}", msg)
            }
        }
    }
}

impl std::error::Error for ExecuteError {}

/// How one execute attempt's response should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    /// 2xx: parse the body and return
    Success,
    /// 422: likely a structural defect in the plan; retryable
    RetryableRejected,
    /// 429: rate-limited; retryable
    RetryableThrottled,
    /// 5xx (and anything not otherwise classified); retryable
    RetryableServerError,
    /// Other 4xx: not recoverable by resubmitting
    Fatal,
}

fn classify_status(status: u16) -> Disposition {
    match status {
        200..=299 => Disposition::Success,
        422 => Disposition::RetryableRejected,
        429 => Disposition::RetryableThrottled,
        400..=499 => Disposition::Fatal,
        _ => Disposition::RetryableServerError,
    }
}

/// HTTP client for the executor service's navigate and execute endpoints
#[derive(Debug, Clone)]
pub struct BrowserClient {
    http: Client,
    base_url: String,
}

impl BrowserClient {
    /// Create a client against the given service base URL, reusing the
    /// shared HTTP client
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// The service base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a snapshot of the target page's content.
    ///
    /// Sends a single navigation request and returns the response body as
    /// opaque text. No retries: fetched content is a hard prerequisite for
    /// plan generation, so a failure here aborts the run.
    pub async fn fetch_page_source(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .http
            .post(format!("{}/navigate", self.base_url))
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
            .map_err(|err| FetchError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        response
            .text()
            .await
            .map_err(|err| FetchError::Request(err.to_string()))
    }

    /// Submit a plan to the execute endpoint.
    ///
    /// `timeout` bounds each individual attempt, not the whole retry
    /// sequence. See the module docs for the classification and retry
    /// policy.
    pub async fn execute_plan(
        &self,
        plan: &Value,
        max_retries: u32,
        timeout: Duration,
    ) -> Result<Value, ExecuteError> {
        let url = format!("{}/execute", self.base_url);
        let mut retries = 0u32;

        loop {
            let outcome = self
                .http
                .post(&url)
                .timeout(timeout)
                .json(plan)
                .send()
                .await;

            let response = match outcome {
                Ok(response) => response,
                Err(err) if err.is_timeout() => {
                    if retries >= max_retries {
                        return Err(ExecuteError::TimeoutExhausted {
                            attempts: retries + 1,
                        });
                    }
                    retries += 1;
                    continue;
                }
                Err(err) => return Err(ExecuteError::Transport(err.to_string())),
            };

            let status = response.status().as_u16();
            match classify_status(status) {
                Disposition::Success => {
                    return response
                        .json()
                        .await
                        .map_err(|err| ExecuteError::InvalidBody(err.to_string()));
                }
                Disposition::Fatal => {
                    let detail = read_error_detail(response).await;
                    return Err(ExecuteError::Client { status, detail });
                }
                Disposition::RetryableRejected => {
                    let detail = read_error_detail(response).await;
                    if retries >= max_retries {
                        return Err(ExecuteError::Rejected {
                            detail,
                            attempts: retries + 1,
                        });
                    }
                    retries += 1;
                }
                Disposition::RetryableThrottled | Disposition::RetryableServerError => {
                    let detail = read_error_detail(response).await;
                    if retries >= max_retries {
                        return Err(ExecuteError::RetriesExhausted {
                            status,
                            detail,
                            attempts: retries + 1,
                        });
                    }
                    retries += 1;
                }
            }
        }
    }
}

async fn read_error_detail(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(body) if !body.is_empty() => body,
        _ => "No error details provided".to_string(),
    }
}
