//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod fixtures;
mod scoring;

pub use fixtures::{generate, FixtureFamily, FixtureOptions, FixtureSummary};
pub use scoring::{
    ModelContext, ModelInfo, ModelState, ScoreResponse, ScoringError, ScoringOptions,
    ScoringService,
};
