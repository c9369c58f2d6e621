// ============================================================
// Layer 5 — Forecaster (inference)
// ============================================================
// Rebuilds the trained model from its artifact directory and
// predicts the next future window for one entity.
//
//   past window (scaled, sequence_length points)
//   + entity name → one-hot identity from entities.json
//       │
//       ▼
//   ForecasterModel::forward → future_steps scaled values
//
// Runs on the plain backend; dropout is inactive outside
// autodiff.

use anyhow::{bail, Result};
use burn::prelude::*;

use crate::domain::entity::{EntityId, EntityRegistry};
use crate::domain::error::PipelineError;
use crate::infra::checkpoint::{ModelLoad, ModelStore};
use crate::ml::model::{ForecasterConfig, ForecasterModel};
use crate::ml::InferBackend;

pub struct Forecaster {
    model:    ForecasterModel<InferBackend>,
    config:   ForecasterConfig,
    registry: EntityRegistry,
    device:   <InferBackend as Backend>::Device,
}

impl Forecaster {
    pub fn from_store(store: &ModelStore) -> Result<Self> {
        let missing = || anyhow::anyhow!("No trained model in '{}'. Run 'train' first.", store.dir().display());
        if !store.exists() {
            return Err(missing());
        }

        let device   = Default::default();
        let config   = store.load_model_config()?;
        let registry = store.load_registry()?;
        registry.check_width(config.num_entities)?;

        let model = match store.load_model::<InferBackend>(&config, &device)? {
            ModelLoad::Loaded(model) => model,
            ModelLoad::NotFound => return Err(missing()),
        };
        tracing::info!("Model loaded from '{}'", store.dir().display());
        Ok(Self { model, config, registry, device })
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Predict `future_steps` scaled values following `past`.
    pub fn predict(&self, entity: EntityId, past: &[f32]) -> Result<Vec<f32>> {
        if past.len() != self.config.sequence_length {
            return Err(PipelineError::WidthMismatch {
                name:     "past window",
                expected: self.config.sequence_length,
                found:    past.len(),
            }
            .into());
        }
        if self.registry.name_of(entity).is_none() {
            bail!("entity id {} is outside the trained registry", entity.0);
        }

        let identity = self.registry.one_hot(entity);
        let past_t = Tensor::<InferBackend, 1>::from_floats(past, &self.device)
            .reshape([1, past.len(), 1]);
        let id_t = Tensor::<InferBackend, 1>::from_floats(identity.as_slice(), &self.device)
            .reshape([1, identity.len()]);

        let output: Vec<f32> = self
            .model
            .forward(past_t, id_t)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read prediction: {e:?}"))?;

        tracing::debug!(
            "Forecast for '{}': {} steps",
            self.registry.name_of(entity).unwrap_or_default(),
            output.len()
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_from_saved_model() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let device = Default::default();
        let cfg = ForecasterConfig::new(4, 2, 3);
        let model: ForecasterModel<InferBackend> = cfg.init(&device);
        store.save_model(&model, &cfg, &EntityRegistry::fit(["A", "B"])).unwrap();

        let forecaster = Forecaster::from_store(&store).unwrap();
        let out = forecaster.predict(EntityId(1), &[0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|v| v.is_finite()));

        assert!(forecaster.predict(EntityId(0), &[0.1, 0.2]).is_err());
        assert!(forecaster.predict(EntityId(7), &[0.1, 0.2, 0.3, 0.4]).is_err());
    }

    #[test]
    fn test_missing_model_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Forecaster::from_store(&ModelStore::new(dir.path())).is_err());
    }
}
