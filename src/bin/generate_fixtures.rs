//! Placeholder artifact generator.
//!
//! Fits a scaler and classifier on random data and writes
//! `classifier.json`, `scaler.json`, `feature_names.json` and
//! `manifest.json` into the output directory.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin generate_fixtures -- --test-fixtures-only [--out models] [--family random-forest]
//! ```
//!
//! The generated model is trained on noise. It exists so the service and its
//! tests can run without a real model and must never score real patients.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cardioscore::application::{generate, FixtureFamily, FixtureOptions};

#[derive(Parser, Debug)]
#[command(name = "generate_fixtures")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Write placeholder (meaningless) model artifacts for testing", long_about = None)]
struct Args {
    /// Acknowledge that the output is for tests only
    #[arg(long)]
    test_fixtures_only: bool,

    /// Output directory
    #[arg(short, long, default_value = "models")]
    out: PathBuf,

    /// Classifier family to fit
    #[arg(long, value_enum, default_value_t = FixtureFamily::RandomForest)]
    family: FixtureFamily,

    /// Random seed
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Number of synthetic rows
    #[arg(long, default_value = "100")]
    samples: usize,

    /// Number of trees (random forest only)
    #[arg(long, default_value = "10")]
    trees: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    if !args.test_fixtures_only {
        bail!(
            "refusing to write artifacts: these models are trained on random data. \
             Pass --test-fixtures-only to confirm they are for testing."
        );
    }

    let options = FixtureOptions {
        out_dir: args.out,
        family: args.family,
        seed: args.seed,
        samples: args.samples,
        trees: args.trees,
    };
    let summary = generate(&options).context("failed to generate fixtures")?;

    println!("Wrote {} artifacts to {}", summary.model_type, summary.out_dir.display());
    println!("  samples:             {}", summary.samples);
    println!("  requires_prescaling: {}", summary.requires_prescaling);
    println!();
    println!("WARNING: these artifacts are fitted on random data and carry no clinical meaning.");
    println!("         Use them only for tests and demos.");
    Ok(())
}
