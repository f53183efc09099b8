//! Domain layer for llm-council
//!
//! This crate contains the core types and rules of the council workflow.
//! It has no dependencies on transport, storage or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Council
//!
//! A fixed, ordered **roster** of models answers the same question in
//! parallel (Stage 1). A designated **chairman** model then reads every
//! answer and synthesizes a single final response (Stage 3). The stage
//! numbering keeps the gap left by a peer-review stage that is not run.
//!
//! ## Streaming
//!
//! The chairman's synthesis can be delivered incrementally as
//! [`StreamEvent`] fragments, and a whole message exchange can be observed as
//! an ordered sequence of [`CouncilEvent`]s.

pub mod config;
pub mod context;
pub mod conversation;
pub mod core;
pub mod council;
pub mod prompt;
pub mod session;

// Re-export commonly used types
pub use config::OutputFormat;
pub use context::{ContextDocument, format_context};
pub use conversation::{Conversation, ConversationMessage, ConversationSummary};
pub use core::{error::DomainError, model::Model, question::Question};
pub use council::{
    event::{CouncilEvent, TitlePayload},
    roster::Roster,
    stage::Stage,
    title::{FALLBACK_TITLE, MAX_TITLE_CHARS, clean_title},
    value_objects::{
        CouncilOutcome, ERROR_MODEL_LABEL, ModelResponse, StageOneResult, StageThreeResult,
    },
};
pub use prompt::PromptTemplate;
pub use session::{
    entities::{Message, Role},
    stream::StreamEvent,
};
