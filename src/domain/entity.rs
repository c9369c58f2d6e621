// ============================================================
// Layer 3 — Entity Registry
// ============================================================
// Maps every library name to a stable integer index and
// builds the one-hot identity vector the model is conditioned
// on.
//
// The registry is fit exactly once from the full set of
// observed names (sorted, so the same names always produce
// the same encoding) and then shared by every split. Fitting
// a second registry on a subset would silently change the
// vector width, so nothing downstream constructs one.
//
// Example with names ["A3", "B2", "Lern"]:
//   A3   → index 0 → [1, 0, 0]
//   B2   → index 1 → [0, 1, 0]
//   Lern → index 2 → [0, 0, 1]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::PipelineError;

/// Index of an entity inside its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub usize);

/// Serialized as the plain list of names; the lookup index is
/// rebuilt on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct EntityRegistry {
    /// Sorted unique names; position = EntityId
    names: Vec<String>,
    index: BTreeMap<String, EntityId>,
}

impl From<Vec<String>> for EntityRegistry {
    fn from(names: Vec<String>) -> Self {
        Self::fit(names)
    }
}

impl From<EntityRegistry> for Vec<String> {
    fn from(reg: EntityRegistry) -> Self {
        reg.names
    }
}

impl EntityRegistry {
    /// Fit the registry on every name seen in the dataset.
    /// Duplicates are collapsed and names are sorted.
    pub fn fit<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = names
            .into_iter()
            .map(|n| n.as_ref().to_string())
            .collect();
        unique.sort();
        unique.dedup();
        Self::from_sorted(unique)
    }

    fn from_sorted(names: Vec<String>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), EntityId(i)))
            .collect();
        Self { names, index }
    }

    /// Width of every identity vector produced by this registry
    pub fn num_entities(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn id_of(&self, name: &str) -> Result<EntityId, PipelineError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| PipelineError::UnknownEntity(name.to_string()))
    }

    pub fn name_of(&self, id: EntityId) -> Option<&str> {
        self.names.get(id.0).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// One-hot identity vector for `id`
    pub fn one_hot(&self, id: EntityId) -> Vec<f32> {
        let mut v = vec![0.0f32; self.names.len()];
        if let Some(slot) = v.get_mut(id.0) {
            *slot = 1.0;
        }
        v
    }

    /// Check that a vector width produced elsewhere (e.g. the
    /// static test fixtures) matches this registry.
    pub fn check_width(&self, found: usize) -> Result<(), PipelineError> {
        if found != self.num_entities() {
            return Err(PipelineError::IdentityWidthMismatch {
                expected: self.num_entities(),
                found,
            });
        }
        Ok(())
    }
}
