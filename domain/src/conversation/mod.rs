//! Conversation records kept by the persistence collaborator.

mod entities;

pub use entities::{Conversation, ConversationMessage, ConversationSummary};
