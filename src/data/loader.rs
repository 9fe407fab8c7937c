// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Reads the labelled training corpus from a JSON file:
//
//   [
//     { "squareFootage": 800,  "bedrooms": 2, "price": 150000 },
//     { "squareFootage": 1200, "bedrooms": 3, "price": 200000 },
//     ...
//   ]
//
// Also owns the built-in seed rows that `seed` writes out so a
// fresh checkout has something to train on.

use std::{
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::domain::housing::TrainingExample;
use crate::domain::traits::TrainingCorpus;

/// Training corpus backed by a JSON array file.
/// Implements the TrainingCorpus trait from Layer 3.
pub struct JsonCorpus {
    path: PathBuf,
}

impl JsonCorpus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TrainingCorpus for JsonCorpus {
    async fn fetch_all_training_examples(&self) -> Result<Vec<TrainingExample>> {
        // A missing corpus is an empty corpus; the service turns that
        // into NoTrainingData. Any other I/O failure is a real error.
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(
                    "Corpus file '{}' does not exist, returning empty corpus",
                    self.path.display()
                );
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Cannot read corpus '{}'", self.path.display()));
            }
        };

        let examples: Vec<TrainingExample> = serde_json::from_slice(&bytes)
            .with_context(|| format!("Corpus '{}' is not a JSON array of examples", self.path.display()))?;

        tracing::info!("Loaded {} training examples from '{}'", examples.len(), self.path.display());
        Ok(examples)
    }
}

/// The eight rows a fresh corpus is seeded with.
pub fn seed_examples() -> Vec<TrainingExample> {
    vec![
        TrainingExample::new(800.0,  2, 150_000.0),
        TrainingExample::new(1200.0, 3, 200_000.0),
        TrainingExample::new(1500.0, 3, 250_000.0),
        TrainingExample::new(1800.0, 4, 300_000.0),
        TrainingExample::new(2000.0, 4, 320_000.0),
        TrainingExample::new(2200.0, 5, 360_000.0),
        TrainingExample::new(2400.0, 4, 380_000.0),
        TrainingExample::new(2600.0, 5, 400_000.0),
    ]
}

/// Write `examples` as a pretty-printed JSON corpus, creating parent
/// directories as needed.
pub fn write_corpus(path: &Path, examples: &[TrainingExample]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(examples)?;
    std::fs::write(path, json)
        .with_context(|| format!("Cannot write corpus to '{}'", path.display()))?;
    Ok(())
}
