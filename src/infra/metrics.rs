// ============================================================
// Layer 6 — Training History
// ============================================================
// Per-epoch loss figures. The trainer collects one EpochMetrics
// per pass; the service returns them in TrainingSummary, and
// `train --metrics-csv` writes them out:
//
//   epoch,train_loss,val_loss
//   1,0.412300,0.398100
//   2,0.201700,
//
// An empty val_loss cell means the run held nothing out.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const CSV_HEADER: &str = "epoch,train_loss,val_loss";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochMetrics {
    /// 1-based
    pub epoch:      usize,
    /// Sample-weighted mean MSE over the training rows, normalized units
    pub train_loss: f64,
    /// Mean MSE over the hold-out rows, if any were held out
    pub val_loss:   Option<f64>,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: Option<f64>) -> Self {
        Self { epoch, train_loss, val_loss }
    }

    fn csv_row(&self) -> String {
        let val = self.val_loss.map(|v| format!("{v:.6}")).unwrap_or_default();
        format!("{},{:.6},{}", self.epoch, self.train_loss, val)
    }
}

/// Appends epoch rows to a CSV file, header first.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Creates parent directories, and the header when the file is new.
    /// An existing file keeps its rows; new ones go below.
    pub fn new(csv_path: impl AsRef<Path>) -> Result<Self> {
        let csv_path = csv_path.as_ref().to_path_buf();

        if let Some(dir) = csv_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        }
        if !csv_path.exists() {
            fs::write(&csv_path, format!("{CSV_HEADER}\n"))
                .with_context(|| format!("Cannot create metrics CSV '{}'", csv_path.display()))?;
        }

        Ok(Self { csv_path })
    }

    pub fn log_all(&self, history: &[EpochMetrics]) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.csv_path)?;
        for m in history {
            writeln!(file, "{}", m.csv_row())?;
        }
        tracing::debug!("Wrote {} epochs to '{}'", history.len(), self.csv_path.display());
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_follow_header() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path().join("runs").join("metrics.csv")).unwrap();
        logger
            .log_all(&[EpochMetrics::new(1, 0.5, Some(0.25)), EpochMetrics::new(2, 0.125, None)])
            .unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(csv, "epoch,train_loss,val_loss\n1,0.500000,0.250000\n2,0.125000,\n");
    }

    #[test]
    fn test_second_run_appends_without_new_header() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        MetricsLogger::new(&path).unwrap().log_all(&[EpochMetrics::new(1, 1.0, None)]).unwrap();
        MetricsLogger::new(&path).unwrap().log_all(&[EpochMetrics::new(1, 0.5, None)]).unwrap();

        let csv = fs::read_to_string(&path).unwrap();
        assert_eq!(csv.matches(CSV_HEADER).count(), 1);
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_history_serializes_camel_case() {
        let json = serde_json::to_string(&EpochMetrics::new(3, 0.5, None)).unwrap();
        assert_eq!(json, r#"{"epoch":3,"trainLoss":0.5,"valLoss":null}"#);
    }
}
