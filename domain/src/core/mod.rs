//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`] — an upstream model identifier (e.g. `openai/gpt-4o`)
//! - [`question::Question`] — a validated user query
//! - [`error::DomainError`] — domain-level errors

pub mod error;
pub mod model;
pub mod question;
pub mod string;
