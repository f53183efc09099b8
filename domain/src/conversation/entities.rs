//! Conversation entities

use crate::council::title::FALLBACK_TITLE;
use crate::council::value_objects::{CouncilOutcome, StageOneResult, StageThreeResult};
use crate::session::entities::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ConversationMessage {
    User {
        content: String,
    },
    /// A council answer; both stages are kept for display
    Assistant {
        stage1: Vec<StageOneResult>,
        stage3: StageThreeResult,
    },
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ConversationMessage::User {
            content: content.into(),
        }
    }

    pub fn assistant(outcome: CouncilOutcome) -> Self {
        ConversationMessage::Assistant {
            stage1: outcome.stage1,
            stage3: outcome.stage3,
        }
    }

    /// Project onto the transcript sent to models.
    ///
    /// Assistant turns are represented by the chairman's final answer only.
    pub fn to_message(&self) -> Message {
        match self {
            ConversationMessage::User { content } => Message::user(content.clone()),
            ConversationMessage::Assistant { stage3, .. } => {
                Message::assistant(stage3.response.clone())
            }
        }
    }
}

/// A conversation (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub messages: Vec<ConversationMessage>,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            title: FALLBACK_TITLE.to_string(),
            messages: Vec::new(),
        }
    }

    /// True until the first message has been stored.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Ordered transcript (oldest first) for use as model history.
    pub fn chat_history(&self) -> Vec<Message> {
        self.messages.iter().map(ConversationMessage::to_message).collect()
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id.clone(),
            created_at: self.created_at,
            title: self.title.clone(),
            message_count: self.messages.len(),
        }
    }
}

/// Conversation metadata for list views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub message_count: usize,
}
