//! Tier-balanced college recommendations.
//!
//! The [`recommendations`] module holds the engine: authoritative correction of
//! generated candidates, personalized scoring, deterministic tiering, hard
//! constraint filtering and the bounded pool balancer. [`config`], [`error`] and
//! [`telemetry`] carry the service plumbing shared with the API binary.

pub mod config;
pub mod error;
pub mod recommendations;
pub mod telemetry;
