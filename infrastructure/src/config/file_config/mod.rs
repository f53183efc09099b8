//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into domain and
//! application types once validated.

mod council;
mod limits;
mod logging;
mod openrouter;
mod output;
mod repl;
mod retrieval;

pub use council::FileCouncilConfig;
pub use limits::{FileLimitsConfig, FileTimeoutsConfig};
pub use logging::FileLoggingConfig;
pub use openrouter::{DEFAULT_API_URL, FileOpenRouterConfig};
pub use output::FileOutputConfig;
pub use repl::FileReplConfig;
pub use retrieval::FileRetrievalConfig;

use crate::openrouter::RetryPolicy;
use council_application::EngineParams;
use council_domain::{Model, Roster};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("{0} cannot be 0")]
    ZeroValue(&'static str),

    #[error("council.models cannot be empty")]
    EmptyRoster,

    #[error("model name cannot be empty ({0})")]
    EmptyModelName(&'static str),

    #[error("model {0} appears more than once in council.models")]
    DuplicateModel(String),

    #[error("retrieval.chunk_overlap must be smaller than retrieval.chunk_size")]
    ChunkOverlap,

    #[error("no API key: set {0} or openrouter.api_key")]
    MissingApiKey(String),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub council: FileCouncilConfig,
    pub openrouter: FileOpenRouterConfig,
    pub limits: FileLimitsConfig,
    pub timeouts: FileTimeoutsConfig,
    pub retrieval: FileRetrievalConfig,
    pub output: FileOutputConfig,
    pub repl: FileReplConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration, stopping at the first problem.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.council.models.is_empty() {
            return Err(ConfigValidationError::EmptyRoster);
        }

        let mut seen = HashSet::new();
        for model in &self.council.models {
            if model.trim().is_empty() {
                return Err(ConfigValidationError::EmptyModelName("council.models"));
            }
            if !seen.insert(model.as_str()) {
                return Err(ConfigValidationError::DuplicateModel(model.clone()));
            }
        }

        if self.council.chairman.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName("council.chairman"));
        }
        if let Some(title_model) = &self.council.title_model
            && title_model.trim().is_empty()
        {
            return Err(ConfigValidationError::EmptyModelName("council.title_model"));
        }

        let non_zero = [
            ("limits.concurrency", self.limits.concurrency as u64),
            ("limits.backoff_factor", self.limits.backoff_factor as u64),
            ("timeouts.query_seconds", self.timeouts.query_seconds),
            ("timeouts.title_seconds", self.timeouts.title_seconds),
            ("retrieval.chunk_size", self.retrieval.chunk_size as u64),
        ];
        for (field, value) in non_zero {
            if value == 0 {
                return Err(ConfigValidationError::ZeroValue(field));
            }
        }

        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return Err(ConfigValidationError::ChunkOverlap);
        }

        Ok(())
    }

    /// Build the council roster from `[council]`.
    pub fn roster(&self) -> Result<Roster, ConfigValidationError> {
        self.validate()?;

        let members = self
            .council
            .models
            .iter()
            .map(|m| parse_model(m, "council.models"))
            .collect::<Result<Vec<_>, _>>()?;
        let chairman = parse_model(&self.council.chairman, "council.chairman")?;

        let roster = Roster::new(members, chairman)
            .map_err(|_| ConfigValidationError::EmptyRoster)?;
        Ok(match &self.council.title_model {
            Some(title_model) => {
                roster.with_title_model(parse_model(title_model, "council.title_model")?)
            }
            None => roster,
        })
    }

    /// Timeouts and retrieval depth used by the use cases.
    pub fn engine_params(&self) -> EngineParams {
        EngineParams::default()
            .with_query_timeout(Duration::from_secs(self.timeouts.query_seconds))
            .with_title_timeout(Duration::from_secs(self.timeouts.title_seconds))
            .with_title_wait(Duration::from_secs(self.timeouts.title_wait_seconds))
            .with_retrieval_top_k(self.retrieval.top_k)
    }

    /// Rate-limit retry schedule for the model client.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.limits.max_retries, self.limits.backoff_factor)
    }

    /// API key from the config file or its environment variable.
    pub fn api_key(&self) -> Result<String, ConfigValidationError> {
        self.openrouter
            .resolve_api_key()
            .ok_or_else(|| ConfigValidationError::MissingApiKey(self.openrouter.api_key_env.clone()))
    }

    /// Render the effective configuration as TOML with secrets masked.
    pub fn to_redacted_toml(&self) -> Result<String, toml::ser::Error> {
        let mut shown = self.clone();
        if shown.openrouter.api_key.is_some() {
            shown.openrouter.api_key = Some("********".to_string());
        }
        toml::to_string_pretty(&shown)
    }
}

fn parse_model(name: &str, field: &'static str) -> Result<Model, ConfigValidationError> {
    Model::new(name).map_err(|_| ConfigValidationError::EmptyModelName(field))
}
