// ============================================================
// Layer 4 — Normalizer
// ============================================================
// Maps raw feature and target values into [0,1] using min/max
// statistics taken over the full training set, and maps model
// output back into dollars.
//
//   normalize(v)   = (v - min) / (max - min)
//   denormalize(n) = n * (max - min) + min
//
// Degenerate ranges (every training row shares one value) have
// max == min. normalize() returns 0 for them by convention.
//
// NormalizationParams are computed once per training run and are
// persisted next to the model they were used to train; a model is
// never paired with another run's params.

use serde::{Deserialize, Serialize};

use crate::domain::housing::{PredictionInput, TrainingExample};
use crate::error::PipelineError;

/// Closed interval observed for one field of the training set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Min/max over an iterator; `None` when it is empty.
    fn observe(values: impl Iterator<Item = f64>) -> Option<Self> {
        values.fold(None, |acc, v| match acc {
            None => Some(Self::new(v, v)),
            Some(r) => Some(Self::new(r.min.min(v), r.max.max(v))),
        })
    }

    /// Width of the interval. Zero for a degenerate range.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn normalize(&self, value: f64) -> f64 {
        normalize(value, self.min, self.max)
    }

    /// Inverse of [`FeatureRange::normalize`] for non-degenerate ranges.
    pub fn denormalize(&self, normalized: f64) -> f64 {
        normalized * self.span() + self.min
    }
}

/// Min/max statistics for both features and the price target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationParams {
    pub square_footage: FeatureRange,
    pub bedrooms:       FeatureRange,
    pub price:          FeatureRange,
}

/// Take min and max of every field across `examples`.
///
/// Fails with [`PipelineError::EmptyDataset`] when there is nothing
/// to take a min/max of.
pub fn compute_params(examples: &[TrainingExample]) -> Result<NormalizationParams, PipelineError> {
    let square_footage = FeatureRange::observe(examples.iter().map(|e| e.square_footage))
        .ok_or(PipelineError::EmptyDataset)?;
    let bedrooms = FeatureRange::observe(examples.iter().map(|e| f64::from(e.bedrooms)))
        .ok_or(PipelineError::EmptyDataset)?;
    let price = FeatureRange::observe(examples.iter().map(|e| e.price))
        .ok_or(PipelineError::EmptyDataset)?;

    Ok(NormalizationParams { square_footage, bedrooms, price })
}

/// Scale `value` into [0,1] relative to `[min, max]`.
///
/// Returns 0 when `max == min`; that is the documented policy for a
/// field where every training row had the same value.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return 0.0;
    }
    (value - min) / (max - min)
}

/// Map a normalized model output back to a price.
pub fn denormalize_price(normalized_price: f64, params: &NormalizationParams) -> f64 {
    params.price.denormalize(normalized_price)
}

/// Normalized `[square_footage, bedrooms]` feature row for the model.
pub fn normalize_features(input: &PredictionInput, params: &NormalizationParams) -> [f32; 2] {
    [
        params.square_footage.normalize(input.square_footage) as f32,
        params.bedrooms.normalize(input.bedrooms) as f32,
    ]
}

/// Normalized features and target for one training row.
pub fn normalize_example(example: &TrainingExample, params: &NormalizationParams) -> ([f32; 2], f32) {
    let features = [
        params.square_footage.normalize(example.square_footage) as f32,
        params.bedrooms.normalize(f64::from(example.bedrooms)) as f32,
    ];
    let target = params.price.normalize(example.price) as f32;
    (features, target)
}
