// ============================================================
// Layer 5 — Predictor
// ============================================================
// Prices one PredictionInput with a trained model:
//
//   input → normalize (training params) → forward pass
//         → denormalize price → round to cents
//
// Confidence is the mean of a per-feature range score. It says how
// close the input sits to the data the model was trained on; it is
// NOT a calibrated predictive interval and carries no statistical
// guarantee about the price error.
//
//   inside [min, max]:  0.8 + (1 - |v - mid| / (max - min)) * 0.2   ∈ [0.9, 1.0]
//   outside:            0.8 - min(d / (max - min), 1) * 0.3        ∈ [0.5, 0.8)
//
// Tensors built here are owned by this call and dropped on return,
// on the error path as well.

use burn::{prelude::*, tensor::TensorData};
use chrono::Utc;

use crate::data::preprocessor::{denormalize_price, normalize_features, FeatureRange, NormalizationParams};
use crate::domain::housing::{PredictionInput, PredictionResult};
use crate::error::PipelineError;
use crate::ml::model::HousePriceModel;
use crate::ml::InferBackend;

/// Price `input` with `model`. Range validation is the caller's job;
/// out-of-range inputs are priced and scored with lower confidence.
pub fn predict(
    model:  &HousePriceModel<InferBackend>,
    input:  &PredictionInput,
    params: &NormalizationParams,
) -> Result<PredictionResult, PipelineError> {
    let normalized = forward_one(model, normalize_features(input, params))?;
    Ok(result_from_output(normalized, input, params))
}

/// One forward pass over a single `[1, 2]` feature row.
fn forward_one(model: &HousePriceModel<InferBackend>, features: [f32; 2]) -> Result<f64, PipelineError> {
    let device = Default::default();
    let input  = Tensor::<InferBackend, 2>::from_data(TensorData::new(features.to_vec(), [1, 2]), &device);

    let output: f64 = model.forward(input).into_scalar().elem::<f64>();
    if !output.is_finite() {
        return Err(PipelineError::Prediction("model produced a non-finite output".into()));
    }
    Ok(output)
}

/// Turn a normalized model output into a priced, scored result.
pub fn result_from_output(
    normalized: f64,
    input:      &PredictionInput,
    params:     &NormalizationParams,
) -> PredictionResult {
    let price = round_cents(denormalize_price(normalized, params));

    let sqft_confidence = feature_confidence(input.square_footage, &params.square_footage);
    let beds_confidence = feature_confidence(input.bedrooms, &params.bedrooms);

    PredictionResult {
        price,
        confidence: (sqft_confidence + beds_confidence) / 2.0,
        timestamp:  Utc::now(),
    }
}

fn round_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

/// Score how close `value` is to the training range `[min, max]`.
///
/// Returns 1.0 at the midpoint, 0.9 at either edge, and falls from
/// just under 0.8 down to a floor of 0.5 as `value` moves a full range
/// width outside. A degenerate range (`min == max`) scores 1.0 on the
/// single observed value and 0.5 anywhere else.
pub fn range_confidence(value: f64, min: f64, max: f64) -> f64 {
    feature_confidence(value, &FeatureRange::new(min, max))
}

fn feature_confidence(value: f64, range: &FeatureRange) -> f64 {
    if range.is_degenerate() {
        return if value == range.min { 1.0 } else { 0.5 };
    }

    if range.contains(value) {
        let middle   = (range.min + range.max) / 2.0;
        let distance = (value - middle).abs() / range.span();
        0.8 + (1.0 - distance) * 0.2
    } else {
        let distance_to_range   = if value < range.min { range.min - value } else { value - range.max };
        let normalized_distance = (distance_to_range / range.span()).min(1.0);
        0.8 - normalized_distance * 0.3
    }
}
