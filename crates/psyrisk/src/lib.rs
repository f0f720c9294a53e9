//! Psychosocial-risk questionnaire intake and campaign reporting.
//!
//! The [`workflows::assessment`] module holds the questionnaire state machine,
//! the response store contract and the aggregation/comparison engines.
//! [`workflows::dashboard`] carries the lighter, date-bounded event metrics.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
