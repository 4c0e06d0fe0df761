//! Test plan data model and structural validation.
//!
//! A plan travels the pipeline as untyped JSON (`serde_json::Value`) so
//! that a step the executor service does not recognize is rejected by the
//! service, not silently dropped here. The typed model in this module is
//! the authoring/consuming surface: it serializes to exactly the wire
//! shape the executor accepts.
//!
//! Wire shape:
//!
//! ```json
//! {
//!   "url": "https://example.com",
//!   "test_plan": {
//!     "description": "Brief description of the test",
//!     "steps": [
//!       {"action": "navigate", "value": "https://example.com"},
//!       {"action": "click", "selector": "#submit"}
//!     ]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level plan document: target URL plus the test plan itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDocument {
    /// The resource under test
    pub url: String,

    /// The structured plan
    pub test_plan: TestPlan,
}

/// An ordered test plan produced by the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPlan {
    /// Human-readable summary of intent
    pub description: String,

    /// Steps in execution order (an empty list is a valid no-op plan)
    pub steps: Vec<Step>,
}

/// One executable instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// The browser operation to perform
    pub action: Action,

    /// CSS selector or XPath; required for all actions except `navigate` and `wait`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    /// Typed text for `type`, target URL for `navigate`, expected result for `check`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// The closed set of browser operations the executor service accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Navigate,
    Click,
    Type,
    Wait,
    WaitForLoadState,
    Scroll,
    Check,
    Screenshot,
}

impl PlanDocument {
    /// Create a plan document with no steps
    pub fn new(url: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            test_plan: TestPlan {
                description: description.into(),
                steps: Vec::new(),
            },
        }
    }

    /// Append a step, preserving execution order
    pub fn push_step(&mut self, step: Step) {
        self.test_plan.steps.push(step);
    }

    /// Convert a structurally validated JSON value into the typed model.
    ///
    /// Fails if any step carries an action outside the closed set; run
    /// [`validate`] first if only shallow structure matters.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Convert the typed model back to its wire representation
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("plan document serializes to JSON")
    }
}

impl Step {
    /// Create a step with no selector or value
    pub fn new(action: Action) -> Self {
        Self {
            action,
            selector: None,
            value: None,
        }
    }

    /// Set the selector for this step
    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Set the value for this step
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Result type for validation
pub type ValidationResult = Result<(), ValidationError>;

/// Structural defects a generated plan can carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The generated document is not a JSON object
    NotAnObject,
    /// The top-level `test_plan` key is missing
    MissingTestPlan,
    /// The `steps` key is missing under `test_plan`
    MissingSteps,
    /// `steps` is present but is not an array
    StepsNotArray,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::NotAnObject => write!(f, "Invalid test plan structure"),
            ValidationError::MissingTestPlan => {
                write!(f, "Invalid test plan structure: missing 'test_plan'")
            }
            ValidationError::MissingSteps => write!(f, "Test plan does not contain steps"),
            ValidationError::StepsNotArray => write!(f, "Test plan 'steps' is not a sequence"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Shallow structural validation of a generated plan.
///
/// Checks only that `test_plan` exists, that `steps` exists under it, and
/// that `steps` is a sequence. Individual step shapes are not inspected;
/// an empty `steps` array passes and executes as a no-op.
pub fn validate(plan: &Value) -> ValidationResult {
    let Some(root) = plan.as_object() else {
        return Err(ValidationError::NotAnObject);
    };
    let Some(test_plan) = root.get("test_plan") else {
        return Err(ValidationError::MissingTestPlan);
    };
    let Some(steps) = test_plan.get("steps") else {
        return Err(ValidationError::MissingSteps);
    };
    if !steps.is_array() {
        return Err(ValidationError::StepsNotArray);
    }
    Ok(())
}
