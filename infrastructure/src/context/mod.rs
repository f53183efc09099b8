//! Retrieval context for council questions
//!
//! Provides [`LocalDocumentRetriever`], an in-process implementation of the
//! [`ContextRetriever`](council_application::ContextRetriever) port over
//! documents attached to a conversation.

mod chunker;
mod retriever;

pub use chunker::TextChunker;
pub use retriever::{AttachError, LocalDocumentRetriever};
