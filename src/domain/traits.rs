// ============================================================
// Layer 3 — Collaborator Traits
// ============================================================
// The Prediction Service is wired against these traits, never
// against a concrete datastore. Implementations:
//
//   TrainingCorpus
//     - JsonCorpus          → JSON array file (data/loader.rs)
//     - test doubles        → in-memory rows with call counters
//
//   PredictionLog
//     - JsonlPredictionLog  → one JSON object per line (infra)
//     - test doubles        → failing / recording sinks
//
// Both are async because the real collaborators sit behind a
// database or network hop.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::housing::{PredictionInput, PredictionResult, TrainingExample};

// ─── TrainingCorpus ───────────────────────────────────────────────────────────
/// Source of the full labelled training set.
#[async_trait]
pub trait TrainingCorpus: Send + Sync {
    /// Fetch every training example. An empty Vec is a valid answer.
    async fn fetch_all_training_examples(&self) -> Result<Vec<TrainingExample>>;
}

// ─── PredictionLog ────────────────────────────────────────────────────────────
/// Best-effort sink for served predictions.
///
/// Errors returned here are logged and dropped by the service;
/// they never fail the prediction that produced the record.
#[async_trait]
pub trait PredictionLog: Send + Sync {
    async fn record_prediction(
        &self,
        input:  &PredictionInput,
        result: &PredictionResult,
    ) -> Result<()>;
}
