//! Conversation persistence port
//!
//! The council engine never persists anything itself. The send-message use
//! case reads history from, and appends results to, a [`ConversationStore`].

use async_trait::async_trait;
use council_domain::{Conversation, ConversationSummary, CouncilOutcome};
use thiserror::Error;

/// Errors raised by a conversation store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("Conversation already exists: {0}")]
    AlreadyExists(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Keyed record store for conversations
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create an empty conversation with the given id.
    async fn create(&self, id: &str) -> Result<Conversation, StoreError>;

    /// Load a conversation with all its messages.
    async fn get(&self, id: &str) -> Result<Option<Conversation>, StoreError>;

    /// List conversation metadata, newest first.
    async fn list(&self) -> Result<Vec<ConversationSummary>, StoreError>;

    /// Append a user-authored message.
    async fn append_user_message(&self, id: &str, content: &str) -> Result<(), StoreError>;

    /// Append the council's answer as one assistant-authored record.
    async fn append_assistant_message(
        &self,
        id: &str,
        outcome: &CouncilOutcome,
    ) -> Result<(), StoreError>;

    /// Replace the conversation title.
    async fn update_title(&self, id: &str, title: &str) -> Result<(), StoreError>;
}
