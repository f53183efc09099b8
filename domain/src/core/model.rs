//! Model value object representing an upstream LLM identifier

use super::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An upstream model identifier (Value Object)
///
/// Identifiers are opaque provider-qualified names such as
/// `openai/gpt-5.1` or `anthropic/claude-sonnet-4.5`. They are compared
/// verbatim; no normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Model(String);

impl Model {
    /// Create a model identifier, rejecting empty or whitespace-only names.
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::EmptyModelName);
        }
        Ok(Self(id))
    }

    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Default council roster used when no configuration is supplied
    pub fn default_roster() -> Vec<Model> {
        [
            "openai/gpt-5.1",
            "google/gemini-3-pro-preview",
            "anthropic/claude-sonnet-4.5",
            "x-ai/grok-4",
        ]
        .into_iter()
        .map(|id| Model(id.to_string()))
        .collect()
    }

    /// Default chairman used when no configuration is supplied
    pub fn default_chairman() -> Model {
        Model("google/gemini-3-pro-preview".to_string())
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Model {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Model::new(s)
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Model::new(s).map_err(serde::de::Error::custom)
    }
}
