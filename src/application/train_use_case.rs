// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run in order:
//
//   Step 1: Start the memory probe        (Layer 6 - infra)
//   Step 2: Read every observation        (Layer 4 - data)
//   Step 3: Normalise per entity          (Layer 4 - data)
//   Step 4: Split, window, assemble       (Layer 4 - data)
//   Step 5: Load the test fixtures        (Layer 4 - data)
//   Step 6: Load saved model or build one (Layer 6 - infra)
//   Step 7: Train with early stopping     (Layer 5 - ml)
//   Step 8: Save + web export             (Layer 6 - infra)
//   Step 9: Evaluate validation and test  (Layer 5 - ml)
//   Step 10: Append the run log           (Layer 6 - infra)
//
// The fixtures are loaded before training so a missing or
// mismatched test set fails the run before any epoch is spent.
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use burn::{module::AutodiffModule, prelude::*};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::data::{
    assembler::DatasetAssembler,
    fixtures::FixtureSet,
    loader::{SqliteObservationSource, DEFAULT_TABLE},
    series_store::EntitySeriesStore,
    windower::WindowSpec,
};
use crate::domain::{error::PipelineError, traits::ObservationSource};
use crate::infra::{
    checkpoint::{ModelLoad, ModelStore},
    memory::MemoryProbe,
    metrics::{RunRecorder, TrainingRun},
};
use crate::ml::{
    model::ForecasterConfig,
    trainer::{evaluate, fit, EvalMetrics, FitConfig},
    TrainBackend,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Every setting of a training run. Saved next to the model so
// `predict` windows its input the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub db_path:        String,
    pub table:          String,
    pub model_dir:      String,
    pub web_model_dir:  String,
    pub fixtures_dir:   String,
    pub log_path:       String,
    pub past_span:      usize,
    pub future_span:    usize,
    pub sampling_rate:  usize,
    pub window_stride:  usize,
    pub split_fraction: f64,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub stop_patience:  usize,
    pub lr_patience:    usize,
    pub lr_factor:      f64,
    pub min_lr:         f64,
    pub seed:           u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            db_path:        "prisma/dev.db".to_string(),
            table:          DEFAULT_TABLE.to_string(),
            model_dir:      "trend_prediction_model/base_model".to_string(),
            web_model_dir:  "trend_prediction_model/web_model".to_string(),
            fixtures_dir:   "trend_prediction_model/utils".to_string(),
            log_path:       "trend_prediction_model/model_logging.csv".to_string(),
            past_span:      288,
            future_span:    144,
            sampling_rate:  6,
            window_stride:  6,
            split_fraction: 0.8,
            batch_size:     32,
            epochs:         100,
            lr:             0.01,
            stop_patience:  5,
            lr_patience:    2,
            lr_factor:      0.5,
            min_lr:         1e-5,
            seed:           42,
        }
    }
}

impl TrainConfig {
    /// Validated window geometry; fails on zero or indivisible spans.
    pub fn window_spec(&self) -> Result<WindowSpec, PipelineError> {
        WindowSpec::new(self.past_span, self.future_span, self.sampling_rate, self.window_stride)
    }

    pub fn fit_config(&self) -> FitConfig {
        FitConfig {
            max_epochs:    self.epochs,
            batch_size:    self.batch_size,
            learning_rate: self.lr,
            stop_patience: self.stop_patience,
            lr_patience:   self.lr_patience,
            lr_factor:     self.lr_factor,
            min_lr:        self.min_lr,
            seed:          self.seed,
        }
    }
}

/// What one `execute` call produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run:           TrainingRun,
    /// Training continued from a saved model
    pub resumed:       bool,
    pub best_epoch:    usize,
    pub epochs_run:    usize,
    pub stopped_early: bool,
    pub validation:    EvalMetrics,
    pub test:          EvalMetrics,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<RunReport> {
        let cfg = &self.config;

        // Configuration errors surface before any data is read
        let spec      = cfg.window_spec()?;
        let assembler = DatasetAssembler::new(spec, cfg.split_fraction)?;
        let fit_cfg   = cfg.fit_config();

        // ── Step 1: Peak memory covers data load → logging ────────────────────
        let probe = MemoryProbe::start();

        // ── Step 2-3: Observations → per-entity normalised series ─────────────
        tracing::info!("Loading observations from '{}'", cfg.db_path);
        let rows  = SqliteObservationSource::new(&cfg.db_path, &cfg.table).load_all()?;
        let store = EntitySeriesStore::from_observations(rows)?;
        let registry = store.registry();
        tracing::info!(
            "{} rows across {} entities",
            store.row_count(),
            registry.num_entities()
        );

        // ── Step 4: Split and window ──────────────────────────────────────────
        let data = assembler.assemble(&store)?;
        if data.train.is_empty() {
            return Err(PipelineError::EmptyDataset("training").into());
        }
        if data.val.is_empty() {
            return Err(PipelineError::EmptyDataset("validation").into());
        }

        let model_cfg = ForecasterConfig::new(
            spec.sequence_length(),
            registry.num_entities(),
            spec.future_steps(),
        );

        // ── Step 5: Static test set ───────────────────────────────────────────
        let test_set = FixtureSet::new(&cfg.fixtures_dir).load()?;
        registry.check_width(test_set.num_entities())?;
        test_set.check_shape(model_cfg.sequence_length, model_cfg.num_entities, model_cfg.future_steps)?;

        // ── Step 6: Resume or start fresh ─────────────────────────────────────
        let device      = <TrainBackend as Backend>::Device::default();
        let model_store = ModelStore::new(&cfg.model_dir);
        let (model, resumed) = match model_store.load_model::<TrainBackend>(&model_cfg, &device)? {
            ModelLoad::Loaded(model) => {
                // Same width is not enough: each one-hot slot must still
                // name the same library
                let saved = model_store.load_registry()?;
                if saved.names() != registry.names() {
                    return Err(PipelineError::EntityOrderMismatch {
                        saved:   saved.names().to_vec(),
                        current: registry.names().to_vec(),
                    }
                    .into());
                }
                tracing::info!("Loaded model from previous training");
                (model, true)
            }
            ModelLoad::NotFound => {
                tracing::info!("No saved model found. Building a new model...");
                (model_cfg.init::<TrainBackend>(&device), false)
            }
        };
        model_store.save_train_config(cfg)?;

        // ── Step 7: Train ─────────────────────────────────────────────────────
        let started = Instant::now();
        let outcome = fit(&fit_cfg, model, data.train, data.val.clone(), &device)?;
        let duration = started.elapsed();
        let epochs_run = outcome.history.len();
        tracing::info!(
            "Training finished after {} epochs in {:.1}s",
            epochs_run,
            duration.as_secs_f64()
        );

        // ── Step 8: Persist ───────────────────────────────────────────────────
        let best = outcome.model.valid();
        model_store.save_model(&best, &model_cfg, registry)?;
        model_store.export_web(&cfg.web_model_dir, &best, &model_cfg, registry)?;

        // ── Step 9: Evaluate the restored model ───────────────────────────────
        let validation = evaluate(&best, data.val, cfg.batch_size, &device)?;
        let test       = evaluate(&best, test_set, cfg.batch_size, &device)?;
        tracing::info!(
            "val_loss={:.4} val_mae={:.4} | test_loss={:.4} test_mae={:.4}",
            validation.loss, validation.mae, test.loss, test.mae
        );

        // ── Step 10: Log the run ──────────────────────────────────────────────
        let peak_mb = probe.finish();
        let run = TrainingRun::new(
            store.row_count(),
            peak_mb,
            duration,
            validation.loss,
            validation.mae,
            test.mae,
        );
        RunRecorder::open(&cfg.log_path)?.append(&run)?;

        Ok(RunReport {
            run,
            resumed,
            best_epoch: outcome.best_epoch,
            epochs_run,
            stopped_early: outcome.stopped_early,
            validation,
            test,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures_use_case::{FixturesConfig, FixturesUseCase};
    use crate::data::test_support::{synthetic_rows, write_sqlite};
    use crate::domain::entity::EntityRegistry;
    use crate::ml::model::ForecasterModel;
    use std::path::Path;

    fn small_config(root: &Path) -> TrainConfig {
        let path = |p: &str| root.join(p).to_string_lossy().into_owned();
        TrainConfig {
            db_path:       path("dev.db"),
            model_dir:     path("model/base_model"),
            web_model_dir: path("model/web_model"),
            fixtures_dir:  path("model/utils"),
            log_path:      path("model/model_logging.csv"),
            past_span:     24,
            future_span:   12,
            epochs:        2,
            ..TrainConfig::default()
        }
    }

    fn build_fixtures(cfg: &TrainConfig) {
        FixturesUseCase::new(FixturesConfig {
            test_db_path: cfg.db_path.clone(),
            fixtures_dir: cfg.fixtures_dir.clone(),
            past_span:    cfg.past_span,
            future_span:  cfg.future_span,
            ..FixturesConfig::default()
        })
        .execute()
        .unwrap();
    }

    #[test]
    fn test_config_roundtrip_and_defaults() {
        let cfg = TrainConfig::default();
        let spec = cfg.window_spec().unwrap();
        assert_eq!(spec.sequence_length(), 48);
        assert_eq!(spec.future_steps(), 24);

        let partial: TrainConfig = serde_json::from_str(r#"{"epochs": 3}"#).unwrap();
        assert_eq!(partial.epochs, 3);
        assert_eq!(partial.table, "BibData");
    }

    #[test]
    fn test_indivisible_span_fails_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { past_span: 25, ..small_config(dir.path()) };
        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::IndivisibleSpan { name: "past_span", .. })
        ));
    }

    #[test]
    fn test_second_run_resumes_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = small_config(dir.path());
        let rows = synthetic_rows(&["A3", "B2", "Lern"], 600, 7);
        write_sqlite(Path::new(&cfg.db_path), &rows);

        build_fixtures(&cfg);

        let first = TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert!(!first.resumed);
        assert_eq!(first.run.data_size, 1800);
        assert!(first.epochs_run >= 1 && first.epochs_run <= 2);
        assert!(first.validation.loss.is_finite());
        assert!(first.test.mae.is_finite());
        assert!(Path::new(&cfg.model_dir).join("model.mpk.gz").is_file());
        assert!(Path::new(&cfg.web_model_dir).join("model.json").is_file());

        let second = TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert!(second.resumed);

        let log = std::fs::read_to_string(&cfg.log_path).unwrap();
        assert_eq!(log.lines().count(), 3);

        let saved = ModelStore::new(&cfg.model_dir).load_train_config().unwrap();
        assert_eq!(saved, cfg);
    }

    #[test]
    fn test_resume_rejects_renamed_entities() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = small_config(dir.path());
        write_sqlite(Path::new(&cfg.db_path), &synthetic_rows(&["A3", "B2", "Mensa"], 600, 5));
        build_fixtures(&cfg);

        // Same width, different libraries behind the slots
        let model_cfg = ForecasterConfig::new(4, 3, 2);
        let device = Default::default();
        let model: ForecasterModel<TrainBackend> = model_cfg.init(&device);
        ModelStore::new(&cfg.model_dir)
            .save_model(&model, &model_cfg, &EntityRegistry::fit(["A3", "B2", "Lern"]))
            .unwrap();

        let err = TrainUseCase::new(cfg.clone()).execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::EntityOrderMismatch { .. })
        ));
        assert!(!Path::new(&cfg.log_path).exists());
    }

    #[test]
    fn test_missing_fixtures_fail_before_training() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = small_config(dir.path());
        write_sqlite(Path::new(&cfg.db_path), &synthetic_rows(&["A3", "B2"], 600, 3));

        assert!(TrainUseCase::new(cfg.clone()).execute().is_err());
        assert!(!Path::new(&cfg.model_dir).join("model.mpk.gz").exists());
        assert!(!Path::new(&cfg.log_path).exists());
    }
}
