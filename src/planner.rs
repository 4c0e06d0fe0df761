//! LLM-driven plan generation and result analysis.
//!
//! `generate_plan` issues exactly one completion request embedding the
//! target URL, the fetched page content, and the test requirement, and
//! parses the response as JSON. It performs no semantic validation beyond
//! parse success; shallow structure is checked separately by
//! [`crate::plan::validate`] before the plan reaches the executor.
//!
//! `analyze_results` issues one completion request with the serialized
//! execution results and returns the narrative as opaque text.

use serde_json::Value;

use crate::llm::{LlmClient, LlmError};

/// Errors that can occur during plan generation
#[derive(Debug)]
pub enum GenerateError {
    /// The completion request itself failed
    Llm(LlmError),
    /// The model's output was not valid JSON
    Parse {
        /// Parser diagnostic
        detail: String,
        /// The raw response text, kept for diagnostics
        raw: String,
    },
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateError::Llm(err) => write!(f, "Plan generation failed: {}", err),
            GenerateError::Parse { detail, raw } => write!(
                f,
                "Failed to decode JSON from LLM response: {} (raw response: {})",
                detail, raw
            ),
        }
    }
}

impl std::error::Error for GenerateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerateError::Llm(err) => Some(err),
            GenerateError::Parse { .. } => None,
        }
    }
}

impl From<LlmError> for GenerateError {
    fn from(err: LlmError) -> Self {
        GenerateError::Llm(err)
    }
}

/// Errors that can occur during result analysis
#[derive(Debug)]
pub enum AnalyzeError {
    /// The completion request failed
    Llm(LlmError),
}

impl std::fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyzeError::Llm(err) => write!(f, "Result analysis failed: {}", err),
        }
    }
}

impl std::error::Error for AnalyzeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalyzeError::Llm(err) => Some(err),
        }
    }
}

impl From<LlmError> for AnalyzeError {
    fn from(err: LlmError) -> Self {
        AnalyzeError::Llm(err)
    }
}

/// Build the plan-generation prompt for a target URL, its fetched page
/// content, and the natural-language test requirement
pub fn build_plan_prompt(url: &str, page_source: &str, requirement: &str) -> String {
    format!(
        r#"Create a test plan for {url}
using Playwright CSS selector rules like button:has-text("Submit") or #elementID
ONLY using these list of elements {page_source}
with the following requirements:
{requirement}

Before you start ensure the description is clear and concise and translate it into a sentence in Given When Then format.

Return ONLY a JSON object with the following structure:
{{
  "url": "{url}",
  "test_plan": {{
    "description": "Brief description of the test",
    "steps": [
        {{
        "action": "navigate|click|type|wait|waitForLoadState|scroll|check|screenshot",
        "selector": "CSS selector or XPath (not needed for navigate/wait actions)",
        "value": "Value for type actions or URL for navigate"
        }}
    ]
  }}
}}

Don't include anything else in your response - just the JSON.
IMPORTANT:
- When validations are required ensure the check action is used with the value as the expected result.
- Do not deviate from the list of elements provided, if elements are not provided finish the workflow.
- Only return the JSON object with the test plan.
- Do not include any explanations or additional text.
- Do not include any code blocks or formatting.
"#
    )
}

/// Build the analysis prompt for serialized execution results
pub fn build_analysis_prompt(results: &Value) -> String {
    let serialized =
        serde_json::to_string_pretty(results).unwrap_or_else(|_| results.to_string());
    format!(
        "Analyze these test results and provide a markdown summary covering \
         which steps passed, which failed, and any follow-up worth doing:\n{serialized}"
    )
}

/// Generate a test plan with a single completion request.
///
/// Returns the parsed JSON document untyped; an action string outside the
/// closed set is left for the executor service to reject.
pub async fn generate_plan(
    llm: &dyn LlmClient,
    url: &str,
    page_source: &str,
    requirement: &str,
) -> Result<Value, GenerateError> {
    let prompt = build_plan_prompt(url, page_source, requirement);
    let raw = llm.generate(&prompt).await?;

    serde_json::from_str(&raw).map_err(|err| GenerateError::Parse {
        detail: err.to_string(),
        raw,
    })
}

/// Summarize execution results with a single completion request.
///
/// The response is treated as opaque text; no parsing is performed.
pub async fn analyze_results(
    llm: &dyn LlmClient,
    results: &Value,
) -> Result<String, AnalyzeError> {
    let prompt = build_analysis_prompt(results);
    Ok(llm.generate(&prompt).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmResult;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// Scripted client that returns a fixed response
    struct ScriptedLlm(String);

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn generate(&self, _prompt: &str) -> LlmResult<String> {
            Ok(self.0.clone())
        }
    }

    /// Client whose calls always fail
    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn generate(&self, _prompt: &str) -> LlmResult<String> {
            Err(LlmError::RequestFailed("connection refused".to_string()))
        }
    }

    #[test]
    fn test_plan_prompt_embeds_inputs() {
        let prompt = build_plan_prompt(
            "http://example.com",
            "<button id=\"go\">Go</button>",
            "clicking Go navigates home",
        );
        assert!(prompt.contains("http://example.com"));
        assert!(prompt.contains("<button id=\"go\">Go</button>"));
        assert!(prompt.contains("clicking Go navigates home"));
        assert!(prompt.contains("navigate|click|type|wait|waitForLoadState|scroll|check|screenshot"));
    }

    #[test]
    fn test_analysis_prompt_serializes_results() {
        let prompt = build_analysis_prompt(&json!({"result": "success", "steps": 3}));
        assert!(prompt.contains("\"result\": \"success\""));
        assert!(prompt.contains("markdown"));
    }

    #[tokio::test]
    async fn test_generate_plan_round_trip() {
        let output = json!({
            "url": "http://example.com",
            "test_plan": {"description": "Test", "steps": []}
        });
        let llm = ScriptedLlm(output.to_string());

        let plan = generate_plan(&llm, "http://example.com", "<html></html>", "smoke test")
            .await
            .unwrap();
        assert_eq!(plan, output);
    }

    #[tokio::test]
    async fn test_generate_plan_malformed_output() {
        let llm = ScriptedLlm("not json".to_string());
        match generate_plan(&llm, "http://example.com", "<html></html>", "smoke test").await {
            Err(GenerateError::Parse { raw, .. }) => assert_eq!(raw, "not json"),
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_generate_plan_surfaces_llm_failure() {
        match generate_plan(&FailingLlm, "http://example.com", "", "smoke test").await {
            Err(GenerateError::Llm(err)) => {
                assert!(err.to_string().contains("connection refused"))
            }
            other => panic!("expected llm error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_analyze_results_opaque_text() {
        let llm = ScriptedLlm("## Summary\nAll steps passed.".to_string());
        let summary = analyze_results(&llm, &json!({"result": "success"}))
            .await
            .unwrap();
        assert_eq!(summary, "## Summary\nAll steps passed.");
    }

    #[tokio::test]
    async fn test_analyze_results_surfaces_llm_failure() {
        match analyze_results(&FailingLlm, &json!({})).await {
            Err(AnalyzeError::Llm(_)) => {}
            other => panic!("expected llm error, got {:?}", other.map(|_| ())),
        }
    }
}
