//! Use cases (application services)

pub mod fan_out;
pub mod run_council;
pub mod send_message;

#[cfg(test)]
pub(crate) mod testing;
