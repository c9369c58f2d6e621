// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The pipeline reads observations through a trait so the
// application layer does not care whether they come from
// SQLite, a CSV export or an in-memory test fixture.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::observation::Observation;

// ─── ObservationSource ────────────────────────────────────────────────────────
/// Any component that can hand over every stored observation.
///
/// Implementations:
///   - SqliteObservationSource → one read-everything query
///   - Vec<Observation>        → in-memory data for tests
pub trait ObservationSource {
    /// Load every available observation. No filtering is pushed
    /// down; duplicates and ordering are handled by the store.
    fn load_all(&self) -> Result<Vec<Observation>>;
}

impl ObservationSource for Vec<Observation> {
    fn load_all(&self) -> Result<Vec<Observation>> {
        Ok(self.clone())
    }
}
