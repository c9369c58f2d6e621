// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by several layers:
//
//   checkpoint.rs   ModelStore: saves and loads the model
//                   weights, architecture, entity order and
//                   run settings; exports a JSON copy for the
//                   web client
//
//   memory.rs       counting allocator and the scoped
//                   MemoryProbe that reports a run's peak heap
//
//   metrics.rs      per-epoch metrics and the append-only
//                   CSV log with one row per training run
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model artifact directory
pub mod checkpoint;

/// Peak heap measurement
pub mod memory;

/// Epoch metrics and the run log
pub mod metrics;
