// ============================================================
// Layer 6 — Prediction Log
// ============================================================
// Appends one JSON object per prediction to a .jsonl file:
//
//   {"squareFootage":1500.0,"bedrooms":3.0,"predictedPrice":337500.0,
//    "confidence":0.97,"timestamp":"2026-01-01T00:00:00Z"}
//
// Callers treat a failed write as non-fatal; this module only
// reports it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};

use crate::domain::housing::{PredictionInput, PredictionResult};
use crate::domain::traits::PredictionLog;

/// One line of the prediction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
    pub square_footage:  f64,
    pub bedrooms:        f64,
    pub predicted_price: f64,
    pub confidence:      f64,
    pub timestamp:       DateTime<Utc>,
}

impl PredictionRecord {
    pub fn new(input: &PredictionInput, result: &PredictionResult) -> Self {
        Self {
            square_footage:  input.square_footage,
            bedrooms:        input.bedrooms,
            predicted_price: result.price,
            confidence:      result.confidence,
            timestamp:       result.timestamp,
        }
    }
}

pub struct JsonlPredictionLog {
    path: PathBuf,
    // Serializes appends so concurrent lines never interleave
    write_lock: Mutex<()>,
}

impl JsonlPredictionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PredictionLog for JsonlPredictionLog {
    async fn record_prediction(&self, input: &PredictionInput, result: &PredictionResult) -> Result<()> {
        let mut line = serde_json::to_vec(&PredictionRecord::new(input, result))?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Cannot create log directory '{}'", dir.display()))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Cannot open prediction log '{}'", self.path.display()))?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_appends_one_line_per_prediction() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlPredictionLog::new(dir.path().join("logs").join("predictions.jsonl"));

        let input  = PredictionInput::new(1500.0, 3.0);
        let result = PredictionResult { price: 337_500.0, confidence: 0.97, timestamp: Utc::now() };
        log.record_prediction(&input, &result).await.unwrap();
        log.record_prediction(&input, &result).await.unwrap();

        let text = tokio::fs::read_to_string(log.path()).await.unwrap();
        let records: Vec<PredictionRecord> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], PredictionRecord::new(&input, &result));
        assert!(text.contains("\"predictedPrice\":337500.0"));
    }
}
