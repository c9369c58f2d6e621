// ============================================================
// Layer 4 — Dataset Assembler
// ============================================================
// Builds the flat train/validation arrays the trainer consumes:
//
//   for each entity series:
//       split at floor(split_fraction * len)
//       windows(train part) ──► tag identity ──► train rows
//       windows(val part)   ──► tag identity ──► val rows
//   concatenate across entities
//
// Entities are processed in registry order and each entity's
// windows keep their start-offset order. Every identity vector
// has the width of the *whole* registry, even when a split ends
// up with no rows for some entity.

use ndarray::Array2;

use crate::data::dataset::WindowTensors;
use crate::data::series_store::EntitySeriesStore;
use crate::data::splitter::{split_index, split_train_val};
use crate::data::windower::{WindowGenerator, WindowSpec};
use crate::domain::entity::EntityId;
use crate::domain::error::PipelineError;

/// A tagged window. `offset` indexes the entity's full series.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub entity:   EntityId,
    pub offset:   usize,
    pub past:     Vec<f32>,
    pub future:   Vec<f32>,
    pub identity: Vec<f32>,
}

/// Windows before flattening, plus where each entity was cut.
#[derive(Debug, Clone)]
pub struct SplitWindows {
    pub train:   Vec<Window>,
    pub val:     Vec<Window>,
    /// cutoffs[entity index] = first validation index
    pub cutoffs: Vec<usize>,
}

/// Flat arrays ready for training.
#[derive(Debug, Clone)]
pub struct AssembledDataset {
    pub train: WindowTensors,
    pub val:   WindowTensors,
}

pub struct DatasetAssembler {
    generator:      WindowGenerator,
    split_fraction: f64,
}

impl DatasetAssembler {
    pub fn new(spec: WindowSpec, split_fraction: f64) -> Result<Self, PipelineError> {
        // Validate once up front rather than per entity
        split_index(0, split_fraction)?;
        Ok(Self { generator: WindowGenerator::new(spec), split_fraction })
    }

    pub fn spec(&self) -> &WindowSpec {
        self.generator.spec()
    }

    /// Split every entity and window both halves independently.
    pub fn split_windows(&self, store: &EntitySeriesStore) -> Result<SplitWindows, PipelineError> {
        let registry    = store.registry();
        let mut train   = Vec::new();
        let mut val     = Vec::new();
        let mut cutoffs = Vec::with_capacity(registry.num_entities());

        for series in store.series() {
            let (head, tail) = split_train_val(&series.values, self.split_fraction)?;
            let cutoff       = head.len();
            let identity     = registry.one_hot(series.entity);
            train.reserve(self.spec().window_count(head.len()));
            val.reserve(self.spec().window_count(tail.len()));

            let before = train.len();
            train.extend(self.generator.generate(head).map(|w| Window {
                entity:   series.entity,
                offset:   w.offset,
                past:     w.past,
                future:   w.future,
                identity: identity.clone(),
            }));
            let val_before = val.len();
            val.extend(self.generator.generate(tail).map(|w| Window {
                entity:   series.entity,
                offset:   cutoff + w.offset,
                past:     w.past,
                future:   w.future,
                identity: identity.clone(),
            }));

            tracing::debug!(
                "{}: {} points, cutoff {}, {} train / {} val windows",
                series.name,
                series.len(),
                cutoff,
                train.len() - before,
                val.len() - val_before,
            );
            cutoffs.push(cutoff);
        }

        Ok(SplitWindows { train, val, cutoffs })
    }

    /// Full pipeline: split, window, tag and flatten.
    pub fn assemble(&self, store: &EntitySeriesStore) -> Result<AssembledDataset, PipelineError> {
        let windows = self.split_windows(store)?;
        let width   = store.registry().num_entities();
        tracing::debug!("Split cutoffs per entity: {:?}", windows.cutoffs);

        tracing::info!(
            "Assembled {} train and {} validation windows over {} entities",
            windows.train.len(),
            windows.val.len(),
            width
        );

        Ok(AssembledDataset {
            train: self.flatten(&windows.train, width)?,
            val:   self.flatten(&windows.val, width)?,
        })
    }

    /// Window every entity's *whole* series without a split.
    /// Used to build the static test fixtures.
    pub fn assemble_unsplit(&self, store: &EntitySeriesStore) -> Result<WindowTensors, PipelineError> {
        let registry = store.registry();
        let windows: Vec<Window> = store
            .series()
            .iter()
            .flat_map(|series| {
                let identity = registry.one_hot(series.entity);
                self.generator.generate(&series.values).map(move |w| Window {
                    entity:   series.entity,
                    offset:   w.offset,
                    past:     w.past,
                    future:   w.future,
                    identity: identity.clone(),
                })
            })
            .collect();
        self.flatten(&windows, registry.num_entities())
    }

    fn flatten(&self, windows: &[Window], num_entities: usize) -> Result<WindowTensors, PipelineError> {
        let spec  = self.generator.spec();
        let n     = windows.len();
        let (seq, fut) = (spec.sequence_length(), spec.future_steps());

        let past     = Array2::from_shape_fn((n, seq), |(r, c)| windows[r].past[c]);
        let identity = Array2::from_shape_fn((n, num_entities), |(r, c)| windows[r].identity[c]);
        let future   = Array2::from_shape_fn((n, fut), |(r, c)| windows[r].future[c]);

        WindowTensors::new(past, identity, future)
    }
}
