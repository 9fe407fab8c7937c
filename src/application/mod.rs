// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers into the operations callers
// actually use: predict, initialize, train_new_model, status.
//
// Rules for this layer:
//   - No ML math or tensor code here (Layer 5)
//   - No printing (Layer 1)
//   - No direct file access; collaborators arrive as traits
//     (Layer 3) or as the ModelStore (Layer 6)
//
// It tells other layers what to do and when, and owns the one
// piece of shared state: the active model.

/// Service configuration (JSON file + CLI overrides)
pub mod config;

/// The stateful prediction facade
pub mod prediction_service;
