// ============================================================
// Layer 3 — Housing Domain Types
// ============================================================
// The three records that flow through the pipeline:
//
//   TrainingExample  — one labelled row of the training corpus
//   PredictionInput  — what a caller asks us to price
//   PredictionResult — what we hand back (and log)
//
// Field names serialise in camelCase so corpus files and the
// prediction log read the same as the form fields that feed them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, Violation};

/// Largest square footage accepted for a prediction (inclusive).
pub const MAX_SQUARE_FOOTAGE: f64 = 10_000.0;

/// Accepted bedroom counts (inclusive on both ends).
pub const MIN_BEDROOMS: f64 = 1.0;
pub const MAX_BEDROOMS: f64 = 10.0;

/// One labelled row of the externally owned training corpus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingExample {
    pub square_footage: f64,
    pub bedrooms:       u32,
    pub price:          f64,
}

impl TrainingExample {
    pub fn new(square_footage: f64, bedrooms: u32, price: f64) -> Self {
        Self { square_footage, bedrooms, price }
    }
}

/// Caller-supplied features for a single prediction.
///
/// `bedrooms` is kept as a float so that a non-integer count can be
/// rejected by [`PredictionInput::validate`] instead of being silently
/// truncated at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionInput {
    pub square_footage: f64,
    pub bedrooms:       f64,
}

impl PredictionInput {
    pub fn new(square_footage: f64, bedrooms: f64) -> Self {
        Self { square_footage, bedrooms }
    }

    /// Check range and type constraints.
    ///
    /// * `squareFootage`: finite, `> 0`, `<= 10000`
    /// * `bedrooms`: integer, `>= 1`, `<= 10`
    ///
    /// Every violated constraint is reported, not just the first.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Vec::new();

        // ── Square footage ───────────────────────────────────────────────────
        let sqft = self.square_footage;
        if !sqft.is_finite() {
            violations.push(violation("squareFootage", "must be a finite number"));
        } else if sqft <= 0.0 {
            violations.push(violation("squareFootage", "must be greater than 0"));
        } else if sqft > MAX_SQUARE_FOOTAGE {
            violations.push(violation("squareFootage", "must be at most 10000"));
        }

        // ── Bedrooms ─────────────────────────────────────────────────────────
        let beds = self.bedrooms;
        if !beds.is_finite() || beds.fract() != 0.0 {
            violations.push(violation("bedrooms", "must be an integer"));
        } else if beds < MIN_BEDROOMS {
            violations.push(violation("bedrooms", "must be at least 1"));
        } else if beds > MAX_BEDROOMS {
            violations.push(violation("bedrooms", "must be at most 10"));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations })
        }
    }
}

fn violation(field: &'static str, constraint: &str) -> Violation {
    Violation { field, constraint: constraint.to_string() }
}

/// The priced result of one prediction. Created fresh per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted sale price, rounded to cents
    pub price: f64,

    /// Proximity of the input to the training range, in [0.5, 1.0]
    pub confidence: f64,

    /// When the prediction was made (serialises as ISO-8601)
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(sqft: f64, beds: f64) -> Result<(), ValidationError> {
        PredictionInput::new(sqft, beds).validate()
    }

    #[test]
    fn test_square_footage_boundaries() {
        assert!(check(-100.0, 3.0).unwrap_err().touches("squareFootage"));
        assert!(check(0.0, 3.0).is_err());
        assert!(check(10_000.0, 3.0).is_ok());
        assert!(check(10_001.0, 3.0).unwrap_err().touches("squareFootage"));
        assert!(check(f64::NAN, 3.0).is_err());
        assert!(check(f64::INFINITY, 3.0).is_err());
    }

    #[test]
    fn test_bedroom_boundaries() {
        assert!(check(1500.0, 3.5).unwrap_err().touches("bedrooms"));
        assert!(check(1500.0, 0.0).unwrap_err().touches("bedrooms"));
        assert!(check(1500.0, 1.0).is_ok());
        assert!(check(1500.0, 10.0).is_ok());
        assert!(check(1500.0, 11.0).is_err());
    }

    #[test]
    fn test_reports_both_fields() {
        let err = check(-1.0, 0.5).unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert!(err.touches("squareFootage"));
        assert!(err.touches("bedrooms"));
    }

    #[test]
    fn test_training_example_reads_camel_case() {
        let json = r#"{"squareFootage": 1200, "bedrooms": 3, "price": 200000}"#;
        let ex: TrainingExample = serde_json::from_str(json).unwrap();
        assert_eq!(ex, TrainingExample::new(1200.0, 3, 200_000.0));
    }
}
