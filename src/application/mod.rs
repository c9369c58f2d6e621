// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each:
// training a model, building the static test fixtures, or
// forecasting one library.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - No direct SQL or recorder calls (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// Builds the held-out test arrays from a frozen database
pub mod fixtures_use_case;

// Forecasts the next window for one library
pub mod predict_use_case;
