//! Application layer for llm-council
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::EngineParams;
pub use ports::{
    context_retriever::{ContextRetriever, NoContextRetriever},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    conversation_store::{ConversationStore, StoreError},
    llm_gateway::{FragmentStream, GatewayError, LlmGateway},
    progress::{NoProgress, ProgressNotifier},
};
pub use use_cases::fan_out::{DispatchResults, FanOutDispatcher};
pub use use_cases::run_council::{CHAIRMAN_STREAM_FAILED, ChunkStream, CouncilPipeline};
pub use use_cases::send_message::{SendMessageError, SendMessageOutput, SendMessageUseCase};
