// ============================================================
// Layer 2 — FixturesUseCase
// ============================================================
// Builds the held-out test arrays once from a separate, frozen
// database. Same path as training data, without the split:
//
//   Step 1: Read every observation   (Layer 4 - data)
//   Step 2: Normalise per entity     (Layer 4 - data)
//   Step 3: Window whole series      (Layer 4 - data)
//   Step 4: Write the three .npy     (Layer 4 - data)
//
// The identity encoding is fit on the test database itself, so
// it must list the same libraries as the training data; the
// train command checks the width before using the fixtures.

use anyhow::Result;

use crate::data::{
    assembler::DatasetAssembler,
    fixtures::FixtureSet,
    loader::{SqliteObservationSource, DEFAULT_TABLE},
    series_store::EntitySeriesStore,
    windower::WindowSpec,
};
use crate::domain::{error::PipelineError, traits::ObservationSource};

#[derive(Debug, Clone)]
pub struct FixturesConfig {
    pub test_db_path:  String,
    pub table:         String,
    pub fixtures_dir:  String,
    pub past_span:     usize,
    pub future_span:   usize,
    pub sampling_rate: usize,
    pub window_stride: usize,
}

impl Default for FixturesConfig {
    fn default() -> Self {
        Self {
            test_db_path:  "trend_prediction_model/utils/test_dataset.db".to_string(),
            table:         DEFAULT_TABLE.to_string(),
            fixtures_dir:  "trend_prediction_model/utils".to_string(),
            past_span:     288,
            future_span:   144,
            sampling_rate: 6,
            window_stride: 6,
        }
    }
}

/// Shape of the arrays that were written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureSummary {
    pub windows:         usize,
    pub sequence_length: usize,
    pub num_entities:    usize,
    pub future_steps:    usize,
}

pub struct FixturesUseCase {
    config: FixturesConfig,
}

impl FixturesUseCase {
    pub fn new(config: FixturesConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<FixtureSummary> {
        let cfg  = &self.config;
        let spec = WindowSpec::new(cfg.past_span, cfg.future_span, cfg.sampling_rate, cfg.window_stride)?;

        tracing::info!("Building test fixtures from '{}'", cfg.test_db_path);
        let rows  = SqliteObservationSource::new(&cfg.test_db_path, &cfg.table).load_all()?;
        let store = EntitySeriesStore::from_observations(rows)?;

        // The split fraction is unused for whole-series windows
        let tensors = DatasetAssembler::new(spec, 1.0)?.assemble_unsplit(&store)?;
        if tensors.is_empty() {
            return Err(PipelineError::EmptyDataset("test").into());
        }

        FixtureSet::new(&cfg.fixtures_dir).save(&tensors)?;

        Ok(FixtureSummary {
            windows:         tensors.len(),
            sequence_length: tensors.sequence_length(),
            num_entities:    tensors.num_entities(),
            future_steps:    tensors.future_steps(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::{synthetic_rows, write_sqlite};
    use std::path::Path;

    #[test]
    fn test_builds_whole_series_windows() {
        let dir = tempfile::tempdir().unwrap();
        let db  = dir.path().join("test_dataset.db");
        write_sqlite(&db, &synthetic_rows(&["A3", "B2", "Lern"], 600, 11));

        let cfg = FixturesConfig {
            test_db_path: db.to_string_lossy().into_owned(),
            fixtures_dir: dir.path().join("utils").to_string_lossy().into_owned(),
            past_span:    24,
            future_span:  12,
            ..FixturesConfig::default()
        };
        let summary = FixturesUseCase::new(cfg.clone()).execute().unwrap();

        // ceil((600 - 36) / 6) = 94 windows per entity
        assert_eq!(
            summary,
            FixtureSummary { windows: 3 * 94, sequence_length: 4, num_entities: 3, future_steps: 2 }
        );

        let loaded = FixtureSet::new(&cfg.fixtures_dir).load().unwrap();
        assert_eq!(loaded.len(), 3 * 94);
        assert!(Path::new(&cfg.fixtures_dir).join("test_targets.npy").is_file());
    }

    #[test]
    fn test_short_series_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let db  = dir.path().join("test_dataset.db");
        write_sqlite(&db, &synthetic_rows(&["A3"], 300, 11));

        let cfg = FixturesConfig {
            test_db_path: db.to_string_lossy().into_owned(),
            fixtures_dir: dir.path().join("utils").to_string_lossy().into_owned(),
            ..FixturesConfig::default()
        };
        let err = FixturesUseCase::new(cfg).execute().unwrap_err();
        assert_eq!(err.downcast_ref::<PipelineError>(), Some(&PipelineError::EmptyDataset("test")));
    }
}
