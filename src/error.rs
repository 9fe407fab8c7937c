// ============================================================
// Error Taxonomy
// ============================================================
// Every failure the prediction pipeline can report to a caller.
//
//   PipelineError   — what the Prediction Service returns
//   ValidationError — rejected PredictionInput, one entry per
//                     violated constraint
//   TrainingError   — fit-time failures (bad options, NaN loss)
//   StoreError      — artifact present but unusable, or write failed
//
// "Never trained yet" is NOT an error: ModelStore::load returns
// Ok(None) for it.

use std::fmt;

use thiserror::Error;

/// Top-level error returned by the Prediction Service.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Normalization parameters are undefined for an empty dataset.
    #[error("cannot compute normalization parameters from an empty dataset")]
    EmptyDataset,

    #[error("no training data available")]
    NoTrainingData,

    #[error("model initialization failed: {0}")]
    ModelInitialization(#[source] Box<PipelineError>),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Training(#[from] TrainingError),

    #[error("prediction failed: {0}")]
    Prediction(String),

    #[error("training corpus unavailable: {0}")]
    Corpus(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PipelineError {
    pub fn corpus(err: anyhow::Error) -> Self {
        Self::Corpus(err.into())
    }
}

/// Fit-time failures. The previously active model survives all of them.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("invalid training options: {0}")]
    InvalidOptions(String),

    #[error("training diverged: non-finite loss at epoch {epoch}")]
    NonFiniteLoss { epoch: usize },

    #[error("training worker failed: {0}")]
    Worker(String),
}

/// Artifact persistence failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("artifact I/O failed for '{blob}': {source}")]
    Io {
        blob:   String,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact '{blob}' is not valid JSON: {source}")]
    Serialization {
        blob:   String,
        #[source]
        source: serde_json::Error,
    },

    #[error("model weights could not be encoded or decoded: {0}")]
    Record(String),

    #[error("stored weights do not match the stored normalization parameters (expected crc32 {expected:08x}, found {found:08x})")]
    Mismatch { expected: u32, found: u32 },

    #[error("unsupported artifact format version {0}")]
    UnsupportedVersion(u32),

    #[error("storage worker failed: {0}")]
    Worker(String),
}

/// One violated input constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field:      &'static str,
    pub constraint: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.constraint)
    }
}

/// Caller-supplied prediction input was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    /// True if any violation concerns `field`.
    pub fn touches(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid prediction input: ")?;
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_every_violation() {
        let err = ValidationError {
            violations: vec![
                Violation { field: "squareFootage", constraint: "must be greater than 0".into() },
                Violation { field: "bedrooms", constraint: "must be an integer".into() },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("squareFootage must be greater than 0"));
        assert!(msg.contains("bedrooms must be an integer"));
        assert!(err.touches("bedrooms"));
        assert!(!err.touches("price"));
    }

    #[test]
    fn test_initialization_error_keeps_cause() {
        let err = PipelineError::ModelInitialization(Box::new(PipelineError::NoTrainingData));
        assert!(err.to_string().contains("no training data available"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
