//! Outcome domain module
//!
//! Outcomes are the documents a workflow renders, once per final context.

mod adapter;
mod entity;

pub use adapter::{OutcomeAdapter, OutcomeAdapterFactory};
pub use entity::{NewOutcome, Outcome, OutcomeFilter, OutcomeType};

#[cfg(test)]
pub use adapter::mock::{CreatedOutcome, MockOutcomeAdapterFactory};
