//! Conversation persistence adapters

mod memory;

pub use memory::InMemoryConversationStore;
