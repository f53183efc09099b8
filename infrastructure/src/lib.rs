//! Infrastructure layer for llm-council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod context;
pub mod logging;
pub mod openrouter;
pub mod storage;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigValidationError, FileConfig};
pub use context::{AttachError, LocalDocumentRetriever, TextChunker};
pub use logging::JsonlConversationLogger;
pub use openrouter::{
    ConcurrencyGate, OpenRouterClient, OpenRouterSettings, RetryPolicy, Sleeper, TokioSleeper,
};
pub use storage::InMemoryConversationStore;
