// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code apart
// from the tensor batching in data/ and the record encoding in
// infra/model_store.rs.
//
//   model.rs     — The fixed 2 → 8 → 4 → 1 regression network,
//                  its MSE loss and Adam configuration
//
//   trainer.rs   — The training loop: normalization, batching,
//                  shuffled epochs, held-out validation loss
//
//   predictor.rs — Single-input inference, denormalization and
//                  the range-confidence heuristic

use burn::backend::{Autodiff, NdArray};

/// CPU backend used for inference, validation and persistence
pub type InferBackend = NdArray;

/// Same backend with gradient tracking, used only while fitting
pub type TrainBackend = Autodiff<NdArray>;

/// House price regression network architecture
pub mod model;

/// Training loop with validation history
pub mod trainer;

/// Inference and confidence scoring
pub mod predictor;
