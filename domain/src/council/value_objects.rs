//! Council value objects - immutable result types for a council run.
//!
//! - [`ModelResponse`] - one successful model reply
//! - [`StageOneResult`] - a roster member's answer, as reported after Stage 1
//! - [`StageThreeResult`] - the chairman's final answer (or a placeholder)
//! - [`CouncilOutcome`] - both stages together

use serde::{Deserialize, Serialize};

/// Model label used on the synthetic result of a run in which no roster
/// member answered.
pub const ERROR_MODEL_LABEL: &str = "error";

/// Successful reply from a single model call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Text of the first choice's message
    pub content: String,
    /// Provider-specific reasoning payload, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_details: Option<serde_json::Value>,
}

impl ModelResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            reasoning_details: None,
        }
    }

    pub fn with_reasoning(mut self, details: serde_json::Value) -> Self {
        self.reasoning_details = Some(details);
        self
    }
}

/// A roster member's Stage 1 answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOneResult {
    pub model: String,
    pub response: String,
}

impl StageOneResult {
    pub fn new(model: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            response: response.into(),
        }
    }
}

/// The chairman's Stage 3 answer
///
/// Exactly one per run. When synthesis cannot happen this carries a
/// human-readable placeholder instead of an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageThreeResult {
    pub model: String,
    pub response: String,
}

impl StageThreeResult {
    pub fn new(model: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            response: response.into(),
        }
    }

    /// Placeholder result for a run in which every roster member failed.
    pub fn all_models_failed() -> Self {
        Self::new(
            ERROR_MODEL_LABEL,
            "All models failed to respond. Please try again.",
        )
    }

    /// Placeholder result for a chairman that could not be reached.
    pub fn chairman_unavailable(chairman: impl Into<String>) -> Self {
        Self::new(
            chairman,
            "The Chairman model is currently unavailable or encountered an error. \
             Please refer to the council member responses above.",
        )
    }

    /// True for the synthetic result produced when Stage 1 came back empty.
    pub fn is_error(&self) -> bool {
        self.model == ERROR_MODEL_LABEL
    }
}

/// Complete result of one council run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouncilOutcome {
    pub stage1: Vec<StageOneResult>,
    pub stage3: StageThreeResult,
}

impl CouncilOutcome {
    pub fn new(stage1: Vec<StageOneResult>, stage3: StageThreeResult) -> Self {
        Self { stage1, stage3 }
    }

    /// Outcome of a run in which no roster member answered.
    pub fn all_failed() -> Self {
        Self::new(Vec::new(), StageThreeResult::all_models_failed())
    }
}
