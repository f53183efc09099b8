//! Document retrieval configuration from TOML (`[retrieval]` section)

use serde::{Deserialize, Serialize};

/// Raw retrieval configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetrievalConfig {
    /// Documents handed to the council per message
    pub top_k: usize,
    /// Chunk length in characters
    pub chunk_size: usize,
    /// Characters shared by neighbouring chunks
    pub chunk_overlap: usize,
}

impl Default for FileRetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}
