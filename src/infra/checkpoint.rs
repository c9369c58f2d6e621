// ============================================================
// Layer 6 — Model Store
// ============================================================
// Saves and restores the forecaster using Burn's file recorders.
//
// Directory layout:
//   trend_prediction_model/
//     base_model/
//       model.mpk.gz        ← weights (NamedMpkGz, full precision)
//       model_config.json   ← architecture the weights belong to
//       train_config.json   ← run settings, reused by `predict`
//       entities.json       ← entity names in identity order
//     web_model/
//       model.json          ← weights as pretty JSON
//       model_config.json
//       entities.json
//
// Loading distinguishes three outcomes:
//   - no weights file      → ModelLoad::NotFound (fresh model)
//   - architecture differs → CheckpointError::ArchitectureMismatch
//   - unreadable artifact  → CheckpointError::Corrupt / Json / Io
//
// A failed write is CheckpointError::Write.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, PrettyJsonFileRecorder},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::application::train_use_case::TrainConfig;
use crate::domain::entity::EntityRegistry;
use crate::ml::model::{ForecasterConfig, ForecasterModel};

const WEIGHTS_STEM: &str = "model";
const WEIGHTS_FILE: &str = "model.mpk.gz";
const WEB_WEIGHTS_FILE: &str = "model.json";
const MODEL_CONFIG_FILE: &str = "model_config.json";
const TRAIN_CONFIG_FILE: &str = "train_config.json";
const ENTITIES_FILE: &str = "entities.json";

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("model artifact '{path}' is unreadable: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("cannot write model to '{path}': {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("saved model ({saved}) does not match this run ({expected})")]
    ArchitectureMismatch { saved: String, expected: String },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in '{path}': {source}")]
    Json {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result of looking for a saved model.
#[derive(Debug)]
pub enum ModelLoad<B: Backend> {
    Loaded(ForecasterModel<B>),
    NotFound,
}

fn shape_label(cfg: &ForecasterConfig) -> String {
    format!(
        "sequence_length={}, num_entities={}, future_steps={}, gru={}/{}, dense={}",
        cfg.sequence_length, cfg.num_entities, cfg.future_steps,
        cfg.gru1_hidden, cfg.gru2_hidden, cfg.dense_hidden,
    )
}

/// Reads and writes the model artifact directory.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    /// Nothing is created until the first save.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn weights_path(&self) -> PathBuf {
        self.dir.join(WEIGHTS_FILE)
    }

    /// Whether a saved model is present.
    pub fn exists(&self) -> bool {
        self.weights_path().is_file()
    }

    /// Load the saved model if there is one.
    ///
    /// The saved architecture must match `expected`; weights are
    /// never loaded into a differently shaped network.
    pub fn load_model<B: Backend>(
        &self,
        expected: &ForecasterConfig,
        device:   &B::Device,
    ) -> Result<ModelLoad<B>, CheckpointError> {
        if !self.exists() {
            tracing::debug!("No weights at '{}'", self.weights_path().display());
            return Ok(ModelLoad::NotFound);
        }

        let saved: ForecasterConfig = self.read_json(MODEL_CONFIG_FILE)?;
        if !saved.same_shape(expected) {
            return Err(CheckpointError::ArchitectureMismatch {
                saved:    shape_label(&saved),
                expected: shape_label(expected),
            });
        }

        let recorder = NamedMpkGzFileRecorder::<FullPrecisionSettings>::new();
        let model = saved
            .init::<B>(device)
            .load_file(self.dir.join(WEIGHTS_STEM), &recorder, device)
            .map_err(|e| CheckpointError::Corrupt {
                path:   self.weights_path(),
                reason: format!("{e:?}"),
            })?;

        tracing::debug!("Loaded weights from '{}'", self.weights_path().display());
        Ok(ModelLoad::Loaded(model))
    }

    /// Write weights, architecture and entity order.
    pub fn save_model<B: Backend>(
        &self,
        model:    &ForecasterModel<B>,
        cfg:      &ForecasterConfig,
        registry: &EntityRegistry,
    ) -> Result<(), CheckpointError> {
        self.create_dir()?;

        let recorder = NamedMpkGzFileRecorder::<FullPrecisionSettings>::new();
        model
            .clone()
            .save_file(self.dir.join(WEIGHTS_STEM), &recorder)
            .map_err(|e| CheckpointError::Write {
                path:   self.weights_path(),
                reason: format!("{e:?}"),
            })?;

        self.write_json(MODEL_CONFIG_FILE, cfg)?;
        self.write_json(ENTITIES_FILE, registry)?;

        tracing::info!("Saved model to '{}'", self.dir.display());
        Ok(())
    }

    /// Write the model as human-readable JSON for the web client.
    pub fn export_web<B: Backend>(
        &self,
        web_dir:  impl AsRef<Path>,
        model:    &ForecasterModel<B>,
        cfg:      &ForecasterConfig,
        registry: &EntityRegistry,
    ) -> Result<(), CheckpointError> {
        let web = ModelStore::new(web_dir);
        web.create_dir()?;

        let recorder = PrettyJsonFileRecorder::<FullPrecisionSettings>::new();
        model
            .clone()
            .save_file(web.dir.join(WEIGHTS_STEM), &recorder)
            .map_err(|e| CheckpointError::Write {
                path:   web.dir.join(WEB_WEIGHTS_FILE),
                reason: format!("{e:?}"),
            })?;

        web.write_json(MODEL_CONFIG_FILE, cfg)?;
        web.write_json(ENTITIES_FILE, registry)?;

        tracing::info!("Exported web model to '{}'", web.dir.display());
        Ok(())
    }

    pub fn save_train_config(&self, cfg: &TrainConfig) -> Result<(), CheckpointError> {
        self.create_dir()?;
        self.write_json(TRAIN_CONFIG_FILE, cfg)
    }

    pub fn load_train_config(&self) -> Result<TrainConfig, CheckpointError> {
        self.read_json(TRAIN_CONFIG_FILE)
    }

    pub fn load_model_config(&self) -> Result<ForecasterConfig, CheckpointError> {
        self.read_json(MODEL_CONFIG_FILE)
    }

    pub fn load_registry(&self) -> Result<EntityRegistry, CheckpointError> {
        self.read_json(ENTITIES_FILE)
    }

    fn create_dir(&self) -> Result<(), CheckpointError> {
        fs::create_dir_all(&self.dir).map_err(|source| CheckpointError::Io {
            path: self.dir.clone(),
            source,
        })
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), CheckpointError> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value).map_err(|source| CheckpointError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| CheckpointError::Io { path: path.clone(), source })?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, CheckpointError> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .map_err(|source| CheckpointError::Io { path: path.clone(), source })?;
        serde_json::from_str(&json).map_err(|source| CheckpointError::Json { path, source })
    }
}
