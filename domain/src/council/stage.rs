//! Council stages

use serde::{Deserialize, Serialize};

/// Stage of a council run
///
/// Numbering follows the original three-stage design; the intermediate
/// peer-review stage is not run, so only Stage 1 and Stage 3 exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Stage 1 - every roster member answers the query
    Collect,
    /// Stage 3 - the chairman synthesizes the collected answers
    Synthesize,
}

impl Stage {
    pub fn as_str(&self) -> &str {
        match self {
            Stage::Collect => "stage1",
            Stage::Synthesize => "stage3",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Stage::Collect => "Stage 1: Collect",
            Stage::Synthesize => "Stage 3: Synthesis",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
