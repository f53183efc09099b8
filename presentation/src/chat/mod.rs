//! Interactive chat module
//!
//! Provides a line-editor based chat interface that keeps one conversation
//! across turns.

mod repl;

pub use repl::{ChatCommand, ChatRepl, ConversationDocuments};
