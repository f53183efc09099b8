//! Council domain: the roster, stage results and the event vocabulary of
//! a council run.
//!
//! - [`roster::Roster`] — ordered council members plus the chairman
//! - [`value_objects`] — immutable per-run results
//! - [`event::CouncilEvent`] — ordered events of a streamed message exchange
//! - [`title`] — conversation title cleanup

pub mod event;
pub mod roster;
pub mod stage;
pub mod title;
pub mod value_objects;
