// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that describe the problem: occupancy
// observations, the entities (libraries) they belong to,
// and the errors the pipeline can raise.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or database calls
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// One timestamped occupancy reading
pub mod observation;

// Entity registry and one-hot identity vectors
pub mod entity;

// Typed pipeline errors
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;

/// Round `value` to `places` decimal places.
/// Used to strip floating-point noise from scaled values
/// and to format logged metrics.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123456, 2), 0.12);
        assert_eq!(round_to(0.125001, 2), 0.13);
        assert_eq!(round_to(12.3456, 3), 12.346);
        assert_eq!(round_to(1.0, 2), 1.0);
    }
}
