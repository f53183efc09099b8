//! OpenRouter model client
//!
//! Implements the [`LlmGateway`](council_application::LlmGateway) port over
//! HTTP: request/response chat completions, SSE streaming, rate-limit
//! retries and process-wide admission control.

mod client;
mod gate;
mod retry;
mod sse;

pub use client::{OpenRouterClient, OpenRouterSettings};
pub use gate::{ConcurrencyGate, GatePermit};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use sse::{SseDecoder, SseFrame, parse_line};
