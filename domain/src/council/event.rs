//! Events of a streamed message exchange

use super::value_objects::{StageOneResult, StageThreeResult};
use crate::context::ContextDocument;
use serde::{Deserialize, Serialize};

/// Payload of `title_complete`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitlePayload {
    pub title: String,
}

/// One event delivered to the caller of a streamed council run.
///
/// The sequence is strictly ordered:
/// `Context`? → `Stage1Start` → `Stage1Complete` → `Stage3Start` →
/// `Stage3Chunk`* → `Stage3Complete` → `TitleComplete`? → `Complete`,
/// and is terminated by exactly one of `Complete` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouncilEvent {
    /// Retrieval found documents for this query
    #[serde(rename = "rag_context")]
    Context { data: Vec<ContextDocument> },
    Stage1Start,
    Stage1Complete { data: Vec<StageOneResult> },
    Stage3Start,
    Stage3Chunk { chunk: String },
    Stage3Complete { data: StageThreeResult },
    TitleComplete { data: TitlePayload },
    Complete,
    Error { message: String },
}

impl CouncilEvent {
    /// `title_complete` event for a generated title.
    pub fn title_complete(title: impl Into<String>) -> Self {
        CouncilEvent::TitleComplete {
            data: TitlePayload {
                title: title.into(),
            },
        }
    }

    /// Wire name of the event (the `type` field).
    pub fn kind(&self) -> &'static str {
        match self {
            CouncilEvent::Context { .. } => "rag_context",
            CouncilEvent::Stage1Start => "stage1_start",
            CouncilEvent::Stage1Complete { .. } => "stage1_complete",
            CouncilEvent::Stage3Start => "stage3_start",
            CouncilEvent::Stage3Chunk { .. } => "stage3_chunk",
            CouncilEvent::Stage3Complete { .. } => "stage3_complete",
            CouncilEvent::TitleComplete { .. } => "title_complete",
            CouncilEvent::Complete => "complete",
            CouncilEvent::Error { .. } => "error",
        }
    }

    /// Returns true for the two events that end a sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CouncilEvent::Complete | CouncilEvent::Error { .. })
    }
}
