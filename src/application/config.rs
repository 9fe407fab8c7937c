// ============================================================
// Layer 2 — Service Configuration
// ============================================================
// Everything needed to wire a PredictionService to real
// collaborators. Read from an optional JSON file; every field has
// a default, so `{}` (or no file at all) is a valid config:
//
//   {
//     "artifactDir":       "model",
//     "artifactBackend":   "fs",
//     "corpusPath":        "data/training_data.json",
//     "predictionLogPath": "predictions.jsonl",
//     "training": { "epochs": 200, "batchSize": 4, "validationSplit": 0.2 }
//   }
//
// CLI flags are applied on top through ConfigOverrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::infra::model_store::ModelStore;
use crate::infra::storage::{FsBackend, MemoryBackend};
use crate::ml::trainer::TrainingOptions;

/// Where model artifacts are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactBackendKind {
    /// One file per blob under `artifact_dir`
    #[default]
    Fs,
    /// Process-local; artifacts vanish on exit
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    pub artifact_dir:        PathBuf,
    pub artifact_backend:    ArtifactBackendKind,
    pub corpus_path:         PathBuf,
    pub prediction_log_path: PathBuf,
    pub training:            TrainingOptions,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            artifact_dir:        PathBuf::from("model"),
            artifact_backend:    ArtifactBackendKind::Fs,
            corpus_path:         PathBuf::from("data/training_data.json"),
            prediction_log_path: PathBuf::from("predictions.jsonl"),
            training:            TrainingOptions { epochs: 200, ..TrainingOptions::default() },
        }
    }
}

/// Optional per-field replacements, typically from CLI flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub artifact_dir:        Option<PathBuf>,
    pub corpus_path:         Option<PathBuf>,
    pub prediction_log_path: Option<PathBuf>,
    pub in_memory_store:     bool,
    pub epochs:              Option<usize>,
    pub batch_size:          Option<usize>,
    pub validation_split:    Option<f64>,
}

impl ServiceConfig {
    /// Parse a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config '{}'", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config '{}'", path.display()))?;
        config.validate()?;
        tracing::debug!("Loaded config from '{}'", path.display());
        Ok(config)
    }

    /// `load(path)` when a path is given, the defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None    => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.training
            .validate()
            .context("Invalid training section")
    }

    pub fn with_overrides(mut self, o: ConfigOverrides) -> Self {
        if let Some(dir) = o.artifact_dir          { self.artifact_dir = dir; }
        if let Some(path) = o.corpus_path          { self.corpus_path = path; }
        if let Some(path) = o.prediction_log_path  { self.prediction_log_path = path; }
        if o.in_memory_store                       { self.artifact_backend = ArtifactBackendKind::Memory; }
        if let Some(n) = o.epochs                  { self.training.epochs = n; }
        if let Some(n) = o.batch_size              { self.training.batch_size = n; }
        if let Some(f) = o.validation_split        { self.training.validation_split = f; }
        self
    }

    /// Build the Model Store over the configured backend.
    pub fn model_store(&self) -> ModelStore {
        match self.artifact_backend {
            ArtifactBackendKind::Fs     => ModelStore::new(FsBackend::new(&self.artifact_dir)),
            ArtifactBackendKind::Memory => ModelStore::new(MemoryBackend::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = ServiceConfig::default();
        assert_eq!(c.artifact_dir, PathBuf::from("model"));
        assert_eq!(c.artifact_backend, ArtifactBackendKind::Fs);
        assert_eq!((c.training.epochs, c.training.batch_size), (200, 4));
        assert_eq!(c.training.validation_split, 0.2);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "corpusPath": "rows.json", "artifactBackend": "memory" }"#).unwrap();

        let c = ServiceConfig::load(&path).unwrap();
        assert_eq!(c.corpus_path, PathBuf::from("rows.json"));
        assert_eq!(c.artifact_backend, ArtifactBackendKind::Memory);
        assert_eq!(c.prediction_log_path, PathBuf::from("predictions.jsonl"));
        assert_eq!(c.training.epochs, 200);
    }

    #[test]
    fn test_invalid_training_section_is_rejected() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "training": { "epochs": 0 } }"#).unwrap();
        assert!(ServiceConfig::load(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error_but_no_path_is_default() {
        assert!(ServiceConfig::load_or_default(Some(Path::new("/definitely/not/here.json"))).is_err());
        assert_eq!(ServiceConfig::load_or_default(None).unwrap(), ServiceConfig::default());
    }

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let c = ServiceConfig::default().with_overrides(ConfigOverrides {
            epochs:          Some(10),
            in_memory_store: true,
            ..Default::default()
        });
        assert_eq!(c.training.epochs, 10);
        assert_eq!(c.training.batch_size, 4);
        assert_eq!(c.artifact_backend, ArtifactBackendKind::Memory);
        assert_eq!(c.artifact_dir, PathBuf::from("model"));
    }
}
