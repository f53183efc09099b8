//! Chat transcript types.
//!
//! - [`entities::Message`] — a single turn sent to an upstream model
//! - [`stream::StreamEvent`] — one event of an incremental model reply

pub mod entities;
pub mod stream;
