// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw occupancy rows to tensor batches:
//
//   SQLite table
//       │
//       ▼
//   SqliteObservationSource → reads every row
//       │
//       ▼
//   EntitySeriesStore       → dedup, sort, per-entity min-max
//       │
//       ▼
//   split_train_val         → chronological cut per entity
//       │
//       ▼
//   WindowGenerator         → (past, future) windows
//       │
//       ▼
//   DatasetAssembler        → tagged, flattened train/val arrays
//       │
//       ▼
//   WindowDataset           → implements Burn's Dataset trait
//       │
//       ▼
//   WindowBatcher           → stacks samples into tensor batches
//
// The static test set takes the same path (without the split)
// and is stored on disk by `fixtures`.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads occupancy rows from SQLite
pub mod loader;

/// Per-entity normalised series
pub mod series_store;

/// Chronological train/validation split
pub mod splitter;

/// Fixed-stride window generation
pub mod windower;

/// Cross-entity dataset assembly
pub mod assembler;

/// Window arrays and Burn's Dataset trait
pub mod dataset;

/// Burn's Batcher trait for window samples
pub mod batcher;

/// Static test fixture arrays (.npy)
pub mod fixtures;

#[cfg(test)]
pub(crate) mod test_support;
