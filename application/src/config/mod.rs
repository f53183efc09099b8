//! Application-level configuration.
//!
//! - [`EngineParams`] — timeouts and retrieval depth used by the council use cases

pub mod engine_params;

pub use engine_params::EngineParams;
