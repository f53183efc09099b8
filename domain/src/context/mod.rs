//! Retrieval context handed to the council.
//!
//! Retrieval itself happens outside the domain; the council only consumes
//! the rendered text produced by [`format_context`].

use serde::{Deserialize, Serialize};

/// A document chunk selected as context for a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDocument {
    /// Name of the file the chunk came from
    pub source: String,
    /// Chunk text
    pub text: String,
    /// Relevance score assigned by the retriever (higher is better)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl ContextDocument {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            score: None,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// Render documents as the plain-text context block given to the models.
///
/// Each document becomes `Source: <source>\nContent: <text>`; documents are
/// separated by a blank line. No documents yields an empty string.
pub fn format_context(documents: &[ContextDocument]) -> String {
    documents
        .iter()
        .map(|d| format!("Source: {}\nContent: {}", d.source, d.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}
