//! Process-local conversation store.

use async_trait::async_trait;
use council_application::{ConversationStore, StoreError};
use council_domain::{
    Conversation, ConversationMessage, ConversationSummary, CouncilOutcome,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// [`ConversationStore`] backed by a map behind an async lock.
///
/// Each operation takes the lock once, so a single append is atomic; a
/// user turn and the answer that follows it are not.
#[derive(Default)]
pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<String, Conversation>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Conversation) -> T + Send,
    ) -> Result<T, StoreError> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(f(conversation))
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create(&self, id: &str) -> Result<Conversation, StoreError> {
        let mut conversations = self.conversations.write().await;
        if conversations.contains_key(id) {
            return Err(StoreError::AlreadyExists(id.to_string()));
        }
        let conversation = Conversation::new(id);
        conversations.insert(id.to_string(), conversation.clone());
        Ok(conversation)
    }

    async fn get(&self, id: &str) -> Result<Option<Conversation>, StoreError> {
        Ok(self.conversations.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<ConversationSummary>, StoreError> {
        let conversations = self.conversations.read().await;
        let mut summaries: Vec<ConversationSummary> =
            conversations.values().map(Conversation::summary).collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn append_user_message(&self, id: &str, content: &str) -> Result<(), StoreError> {
        self.update(id, |c| c.messages.push(ConversationMessage::user(content)))
            .await
    }

    async fn append_assistant_message(
        &self,
        id: &str,
        outcome: &CouncilOutcome,
    ) -> Result<(), StoreError> {
        let message = ConversationMessage::assistant(outcome.clone());
        self.update(id, |c| c.messages.push(message)).await
    }

    async fn update_title(&self, id: &str, title: &str) -> Result<(), StoreError> {
        self.update(id, |c| c.title = title.to_string()).await
    }
}
