//! Engine parameters — per-call timeouts and retrieval depth.
//!
//! [`EngineParams`] groups the static parameters read by
//! [`CouncilPipeline`](crate::use_cases::run_council::CouncilPipeline) and
//! [`SendMessageUseCase`](crate::use_cases::send_message::SendMessageUseCase).
//! Retry and concurrency limits belong to the model client adapter, not here.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeouts and limits for one council engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineParams {
    /// Bound on each individual model query attempt.
    pub query_timeout: Duration,
    /// Bound on each title generation attempt.
    pub title_timeout: Duration,
    /// How long a streamed exchange waits for a concurrently running title
    /// task after synthesis has finished.
    pub title_wait: Duration,
    /// Number of context documents requested from the retriever.
    pub retrieval_top_k: usize,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(120),
            title_timeout: Duration::from_secs(30),
            title_wait: Duration::from_secs(5),
            retrieval_top_k: 3,
        }
    }
}

impl EngineParams {
    // ==================== Builder Methods ====================

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_title_timeout(mut self, timeout: Duration) -> Self {
        self.title_timeout = timeout;
        self
    }

    pub fn with_title_wait(mut self, wait: Duration) -> Self {
        self.title_wait = wait;
        self
    }

    pub fn with_retrieval_top_k(mut self, k: usize) -> Self {
        self.retrieval_top_k = k;
        self
    }
}
