//! Streaming events for incremental model replies.
//!
//! A reply stream is finite and not restartable. It yields zero or more
//! [`StreamEvent::Delta`] fragments in arrival order and ends either
//! silently (graceful end of stream) or with exactly one
//! [`StreamEvent::Error`], after which nothing else is yielded.

/// An event in a streaming model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A text fragment from the model.
    Delta(String),
    /// The stream failed; this is always the last event.
    Error(String),
}
