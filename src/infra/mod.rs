// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Persistence and side channels that the business layers use
// but do not own:
//
//   storage.rs        — Byte-level artifact backends
//                       (directory on disk, or in memory)
//
//   model_store.rs    — Saves / loads a trained model together
//                       with its normalization params, verified
//                       by a CRC32 over the weights
//
//   prediction_log.rs — Append-only JSONL record of served
//                       predictions
//
//   metrics.rs        — Per-epoch training loss, kept in the
//                       training summary and optionally as CSV
//
// Everything here is reached through a narrow interface
// (ArtifactBackend, ModelStore, PredictionLog) so the service
// never touches a path directly.

/// Artifact byte storage
pub mod storage;

/// Model + normalization persistence
pub mod model_store;

/// JSONL prediction log
pub mod prediction_log;

/// Training metrics CSV logger
pub mod metrics;
