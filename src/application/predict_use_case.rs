// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Forecasts the next future window for one library:
//
//   Step 1: Load model + run settings     (Layer 6 - infra)
//   Step 2: Read and normalise the series (Layer 4 - data)
//   Step 3: Take the latest past_span raw points, sub-sampled
//   Step 4: Predict and map back to percentages
//
// The input is windowed with the settings saved at training
// time, so the past window always has the trained length.

use anyhow::Result;

use crate::data::{
    loader::SqliteObservationSource,
    series_store::EntitySeriesStore,
    windower::WindowSpec,
};
use crate::domain::{error::PipelineError, traits::ObservationSource};
use crate::infra::checkpoint::ModelStore;
use crate::ml::inferencer::Forecaster;

/// Predicted values for one entity, in model and raw scale.
#[derive(Debug, Clone)]
pub struct Forecast {
    pub entity:      String,
    pub scaled:      Vec<f32>,
    pub percentages: Vec<f64>,
}

pub struct PredictUseCase {
    model_dir: String,
    /// Overrides the database recorded at training time
    db_path:   Option<String>,
}

impl PredictUseCase {
    pub fn new(model_dir: impl Into<String>, db_path: Option<String>) -> Self {
        Self { model_dir: model_dir.into(), db_path }
    }

    pub fn forecast(&self, entity: &str) -> Result<Forecast> {
        let store      = ModelStore::new(&self.model_dir);
        let forecaster = Forecaster::from_store(&store)?;
        let train_cfg  = store.load_train_config()?;
        let spec       = train_cfg.window_spec()?;

        let db_path = self.db_path.as_deref().unwrap_or(&train_cfg.db_path);
        let rows    = SqliteObservationSource::new(db_path, &train_cfg.table).load_all()?;
        let series_store = EntitySeriesStore::from_observations(rows)?;
        let series  = series_store.by_name(entity)?;

        // Identity comes from the registry the model was trained with
        let id   = forecaster.registry().id_of(entity)?;
        let past = latest_past_window(&series.name, &series.values, &spec)?;

        let scaled = forecaster.predict(id, &past)?;
        let percentages = scaled
            .iter()
            .map(|&v| series.scaler.inverse_transform(f64::from(v)))
            .collect();

        Ok(Forecast { entity: entity.to_string(), scaled, percentages })
    }
}

/// The most recent `past_span` points of `values`, sub-sampled at
/// `sampling_rate` the same way training windows are.
pub fn latest_past_window(name: &str, values: &[f32], spec: &WindowSpec) -> Result<Vec<f32>, PipelineError> {
    let span = spec.past_span();
    if values.len() < span {
        return Err(PipelineError::SeriesTooShort {
            name:      name.to_string(),
            available: values.len(),
            needed:    span,
        });
    }
    Ok(values[values.len() - span..]
        .iter()
        .step_by(spec.sampling_rate())
        .copied()
        .collect())
}
