//! LLM Gateway port
//!
//! Defines the interface for querying upstream models. Every call resolves to
//! an explicit outcome: a [`ModelResponse`] or a tagged [`GatewayError`].
//! Nothing above this boundary ever sees a transport-level failure in any
//! other form.

use async_trait::async_trait;
use council_domain::{Message, Model, ModelResponse, StreamEvent};
use futures::stream::BoxStream;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during a single model call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Rate limit exceeded for {model} after {attempts} attempts")]
    RateLimited { model: String, attempts: u32 },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// A finite, non-restartable sequence of reply fragments.
///
/// Dropping the stream releases the underlying connection and any admission
/// slot it holds.
pub type FragmentStream = BoxStream<'static, StreamEvent>;

/// Gateway for LLM communication
///
/// This port defines how the application layer talks to model endpoints.
/// Implementations (adapters) live in the infrastructure layer and own
/// retries, backoff and admission control.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send `messages` to `model` and wait for the complete reply.
    ///
    /// `timeout` bounds each individual attempt, not the whole retry loop.
    async fn query(
        &self,
        model: &Model,
        messages: &[Message],
        timeout: Duration,
    ) -> Result<ModelResponse, GatewayError>;

    /// Send `messages` to `model` and receive the reply incrementally.
    ///
    /// The stream yields text deltas in arrival order. A failure at any point
    /// (including connection establishment) ends the stream with exactly one
    /// [`StreamEvent::Error`].
    fn query_stream(&self, model: &Model, messages: &[Message], timeout: Duration)
    -> FragmentStream;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_display() {
        let error = GatewayError::RateLimited {
            model: "openai/gpt-4o".to_string(),
            attempts: 4,
        };
        assert_eq!(
            error.to_string(),
            "Rate limit exceeded for openai/gpt-4o after 4 attempts"
        );
    }
}
