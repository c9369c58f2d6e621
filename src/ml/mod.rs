// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model and training code lives here.
//
//   model.rs        GRU encoder conditioned on the entity
//                   identity vector, dense regression head
//
//   schedule.rs     early stopping and step-size reduction
//                   driven by validation loss
//
//   trainer.rs      epoch loop: forward, MSE loss, backward,
//                   Adam step, validation, evaluation
//
//   inferencer.rs   loads a saved model and forecasts the next
//                   window for one entity
//
// Backend selection:
//   default       → NdArray (CPU)
//   --features wgpu → Wgpu (GPU)
// Training wraps the backend in Autodiff; validation and
// inference run on the plain backend (`model.valid()`).
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// GRU forecaster architecture
pub mod model;

/// Early stopping and learning-rate plateau schedule
pub mod schedule;

/// Training loop and evaluation
pub mod trainer;

/// Single-entity forecasting from a saved model
pub mod inferencer;

#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;
