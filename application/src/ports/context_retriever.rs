//! Context retrieval port
//!
//! Retrieval is optional enrichment: implementations degrade to "no
//! documents" on failure rather than failing the message.

use async_trait::async_trait;
use council_domain::ContextDocument;

/// Finds documents relevant to a query within one conversation
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    /// Return at most `k` documents, best first.
    async fn search(&self, conversation_id: &str, query: &str, k: usize) -> Vec<ContextDocument>;
}

/// Retriever that never finds anything
pub struct NoContextRetriever;

#[async_trait]
impl ContextRetriever for NoContextRetriever {
    async fn search(&self, _conversation_id: &str, _query: &str, _k: usize) -> Vec<ContextDocument> {
        Vec::new()
    }
}
