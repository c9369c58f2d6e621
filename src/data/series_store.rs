// ============================================================
// Layer 4 — Entity Series Store
// ============================================================
// Turns the raw observation rows into one normalised series
// per entity:
//
//   raw rows ──► dedup ──► sort (entity, year, month, day, chunk)
//            ──► group by entity ──► min-max scale per entity
//            ──► round to 2 decimals
//
// Every library gets its own scaler. A library that peaks at
// 60% and one that peaks at 100% both end up spanning [0, 1],
// so the shared model sees comparable shapes.
//
// Rounding to 2 decimals strips the floating-point noise that
// the scaling division introduces (0.30000000000000004 → 0.3).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::entity::{EntityId, EntityRegistry};
use crate::domain::error::PipelineError;
use crate::domain::observation::Observation;
use crate::domain::round_to;

/// Decimal places kept after scaling
pub const SCALED_PRECISION: i32 = 2;

// ─── MinMaxScaler ─────────────────────────────────────────────────────────────
/// Per-entity min-max scaler: x' = (x - min) / (max - min).
/// A zero range is treated as a unit range, so a constant
/// series maps to all zeros instead of NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub min: f64,
    pub max: f64,
}

impl MinMaxScaler {
    /// Fit on one entity's raw values.
    pub fn fit(entity: &str, values: &[f64]) -> Result<Self, PipelineError> {
        if values.is_empty() {
            return Err(PipelineError::EmptySeries(entity.to_string()));
        }
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Ok(Self { min, max })
    }

    fn range(&self) -> f64 {
        let r = self.max - self.min;
        if r == 0.0 { 1.0 } else { r }
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.min) / self.range()
    }

    /// Map a scaled value back to a raw percentage
    pub fn inverse_transform(&self, scaled: f64) -> f64 {
        scaled * self.range() + self.min
    }
}

// ─── NormalizedSeries ─────────────────────────────────────────────────────────
/// One entity's chronologically ordered, scaled values.
#[derive(Debug, Clone)]
pub struct NormalizedSeries {
    pub entity: EntityId,
    pub name:   String,
    pub values: Vec<f32>,
    pub scaler: MinMaxScaler,
}

impl NormalizedSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ─── EntitySeriesStore ────────────────────────────────────────────────────────
pub struct EntitySeriesStore {
    registry:  EntityRegistry,
    /// Indexed by EntityId
    series:    Vec<NormalizedSeries>,
    /// Rows left after deduplication
    row_count: usize,
}

impl EntitySeriesStore {
    /// Build the store from raw rows (any order, may contain duplicates).
    pub fn from_observations(mut rows: Vec<Observation>) -> Result<Self, PipelineError> {
        if rows.is_empty() {
            return Err(PipelineError::NoObservations);
        }

        // Sort so exact duplicates become neighbours, then drop them.
        // Percentage is the last tie-breaker only to make the
        // duplicates adjacent; the chronological order is unaffected.
        rows.sort_by(|a, b| {
            a.entity
                .cmp(&b.entity)
                .then(a.key.cmp(&b.key))
                .then(a.percentage.total_cmp(&b.percentage))
        });
        rows.dedup_by(|a, b| a.same_row(b));
        let row_count = rows.len();

        let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for row in rows {
            grouped.entry(row.entity).or_default().push(row.percentage);
        }

        let registry = EntityRegistry::fit(grouped.keys());
        let store    = Self::from_grouped(registry, grouped, row_count)?;

        tracing::debug!(
            "Series store: {} rows across {} entities",
            store.row_count,
            store.registry.num_entities()
        );
        Ok(store)
    }

    /// Scale already grouped, already ordered raw series.
    /// Every registry entity must have a series.
    fn from_grouped(
        registry:  EntityRegistry,
        mut raw:   BTreeMap<String, Vec<f64>>,
        row_count: usize,
    ) -> Result<Self, PipelineError> {
        let mut series = Vec::with_capacity(registry.num_entities());

        for name in registry.names() {
            let values = raw.remove(name).unwrap_or_default();
            let scaler = MinMaxScaler::fit(name, &values)?;
            let scaled = values
                .iter()
                .map(|&v| round_to(scaler.transform(v), SCALED_PRECISION) as f32)
                .collect();

            series.push(NormalizedSeries {
                entity: registry.id_of(name)?,
                name:   name.clone(),
                values: scaled,
                scaler,
            });
        }

        Ok(Self { registry, series, row_count })
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn series(&self) -> &[NormalizedSeries] {
        &self.series
    }

    pub fn get(&self, id: EntityId) -> Option<&NormalizedSeries> {
        self.series.get(id.0)
    }

    pub fn by_name(&self, name: &str) -> Result<&NormalizedSeries, PipelineError> {
        let id = self.registry.id_of(name)?;
        self.get(id)
            .ok_or_else(|| PipelineError::UnknownEntity(name.to_string()))
    }
}
