//! # Cardioscore
//!
//! Heart-failure mortality risk scoring service.
//!
//! This crate provides:
//! - Typed extraction of twelve clinical measurements from form submissions
//! - Scoring against a pre-trained binary classifier (with optional scaling)
//! - Four-tier risk bucketing of the predicted death-event probability
//! - A small web surface (landing page, `/predict`, `/api/info`)
//! - A generator for placeholder artifacts used in tests and demos
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (clinical features, assessment, risk levels)
//! - `ports`: Trait definitions for the classifier and scaler
//! - `adapters`: Concrete model families, artifact store, log sanitizer
//! - `application`: Scoring and fixture-generation use cases
//! - `web`: axum router and server loop
//! - `config`: Command line / environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod web;

pub use domain::{Assessment, ClinicalFeatures, RiskLevel};

/// Result type for Cardioscore operations
pub type Result<T> = std::result::Result<T, CardioscoreError>;

/// Main error type for Cardioscore
#[derive(Debug, thiserror::Error)]
pub enum CardioscoreError {
    #[error("Artifact error: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Model fitting failed: {0}")]
    Fit(#[from] adapters::models::FitError),

    #[error("Inference failed: {0}")]
    Inference(#[from] ports::InferenceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
