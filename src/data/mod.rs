// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between raw training rows and tensor batches.
//
//   JsonCorpus / seed rows  → TrainingExample rows
//       │
//       ▼
//   preprocessor            → min/max params, [0,1] scaling
//       │
//       ▼
//   splitter                → shuffled train / hold-out split
//       │
//       ▼
//   HousingDataset          → implements Burn's Dataset trait
//       │
//       ▼
//   HousingBatcher          → stacks rows into N×2 / N×1 tensors
//       │
//       ▼
//   DataLoader              → feeds batches to the training loop

/// JSON corpus file loader and the built-in seed rows
pub mod loader;

/// Normalization parameters and min/max scaling
pub mod preprocessor;

/// Implements Burn's Dataset trait for normalized rows
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles rows and splits off the validation hold-out
pub mod splitter;
