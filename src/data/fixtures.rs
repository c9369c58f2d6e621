// ============================================================
// Layer 4 — Test Fixture Arrays
// ============================================================
// The test set is built once from a separate, frozen database
// and stored as three NumPy arrays so every training run is
// scored against the exact same windows:
//
//   test_sequences.npy       float64 [n, sequence_length, 1]
//   test_library_inputs.npy  float64 [n, num_entities]
//   test_targets.npy         float64 [n, future_steps]
//
// The trailing feature axis on the sequences matches the model's
// input layout.
//
// Reference: ndarray-npy crate documentation

use anyhow::{Context, Result};
use ndarray::{Array2, Array3, Axis};
use ndarray_npy::{read_npy, write_npy};
use std::path::{Path, PathBuf};

use crate::data::dataset::WindowTensors;

pub const SEQUENCES_FILE: &str = "test_sequences.npy";
pub const IDENTITIES_FILE: &str = "test_library_inputs.npy";
pub const TARGETS_FILE: &str = "test_targets.npy";

/// Location of the three fixture files.
#[derive(Debug, Clone)]
pub struct FixtureSet {
    dir: PathBuf,
}

impl FixtureSet {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn sequences_path(&self) -> PathBuf  { self.dir.join(SEQUENCES_FILE) }
    pub fn identities_path(&self) -> PathBuf { self.dir.join(IDENTITIES_FILE) }
    pub fn targets_path(&self) -> PathBuf    { self.dir.join(TARGETS_FILE) }

    /// Load the fixture arrays. Missing files are an error; the
    /// fixtures are never regenerated implicitly.
    pub fn load(&self) -> Result<WindowTensors> {
        let seq: Array3<f64> = read_npy(self.sequences_path())
            .with_context(|| format!("Cannot read '{}'", self.sequences_path().display()))?;
        let ids: Array2<f64> = read_npy(self.identities_path())
            .with_context(|| format!("Cannot read '{}'", self.identities_path().display()))?;
        let tgt: Array2<f64> = read_npy(self.targets_path())
            .with_context(|| format!("Cannot read '{}'", self.targets_path().display()))?;

        anyhow::ensure!(
            seq.len_of(Axis(2)) == 1,
            "'{}' must have a single feature column, found {}",
            self.sequences_path().display(),
            seq.len_of(Axis(2))
        );

        let past = seq.index_axis(Axis(2), 0).mapv(|v| v as f32);
        let tensors = WindowTensors::new(past, ids.mapv(|v| v as f32), tgt.mapv(|v| v as f32))?;

        tracing::info!(
            "Loaded {} test windows from '{}'",
            tensors.len(),
            self.dir.display()
        );
        Ok(tensors)
    }

    /// Write `tensors` as the fixture arrays, creating the directory.
    pub fn save(&self, tensors: &WindowTensors) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let seq: Array3<f64> = tensors.past().mapv(f64::from).insert_axis(Axis(2));
        let ids: Array2<f64> = tensors.identity().mapv(f64::from);
        let tgt: Array2<f64> = tensors.future().mapv(f64::from);

        write_npy(self.sequences_path(), &seq)
            .with_context(|| format!("Cannot write '{}'", self.sequences_path().display()))?;
        write_npy(self.identities_path(), &ids)
            .with_context(|| format!("Cannot write '{}'", self.identities_path().display()))?;
        write_npy(self.targets_path(), &tgt)
            .with_context(|| format!("Cannot write '{}'", self.targets_path().display()))?;

        tracing::info!("Saved {} test windows to '{}'", tensors.len(), self.dir.display());
        Ok(())
    }
}
