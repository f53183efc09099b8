//! Council roster configuration from TOML (`[council]` section)

use council_domain::Model;
use serde::{Deserialize, Serialize};

/// Raw council configuration from TOML
///
/// Model names stay plain strings here; they are checked by
/// [`FileConfig::validate`](super::FileConfig::validate) and turned into a
/// [`Roster`](council_domain::Roster) afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    /// Ordered roster queried in Stage 1
    pub models: Vec<String>,
    /// Model that writes the final synthesis
    pub chairman: String,
    /// Model used for conversation titles (first roster entry if unset)
    pub title_model: Option<String>,
}

impl Default for FileCouncilConfig {
    fn default() -> Self {
        Self {
            models: Model::default_roster()
                .into_iter()
                .map(|m| m.to_string())
                .collect(),
            chairman: Model::default_chairman().to_string(),
            title_model: None,
        }
    }
}
