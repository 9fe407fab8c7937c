// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits that define the core concepts:
// training rows, prediction requests and results, and the
// collaborator contracts the pipeline consumes.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits

/// Training rows, prediction inputs and prediction results
pub mod housing;

/// Collaborator contracts: training corpus and prediction log
pub mod traits;
