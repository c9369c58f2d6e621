use burn::data::dataset::Dataset;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::domain::error::PipelineError;

/// One supervised sample as seen by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSample {
    /// Sub-sampled past occupancy, length = sequence_length
    pub past:     Vec<f32>,
    /// One-hot entity identity, length = num_entities
    pub identity: Vec<f32>,
    /// Sub-sampled future occupancy, length = future_steps
    pub future:   Vec<f32>,
}

/// Flat, row-aligned arrays for a whole split:
///   past     [n, sequence_length]
///   identity [n, num_entities]
///   future   [n, future_steps]
#[derive(Debug, Clone, PartialEq)]
pub struct WindowTensors {
    past:     Array2<f32>,
    identity: Array2<f32>,
    future:   Array2<f32>,
}

impl WindowTensors {
    pub fn new(
        past:     Array2<f32>,
        identity: Array2<f32>,
        future:   Array2<f32>,
    ) -> Result<Self, PipelineError> {
        let rows = (past.nrows(), identity.nrows(), future.nrows());
        if rows.0 != rows.1 || rows.0 != rows.2 {
            return Err(PipelineError::RowCountMismatch {
                past:     rows.0,
                identity: rows.1,
                future:   rows.2,
            });
        }
        Ok(Self { past, identity, future })
    }

    /// Empty arrays with the right column counts
    #[cfg(test)]
    pub fn empty(sequence_length: usize, num_entities: usize, future_steps: usize) -> Self {
        Self {
            past:     Array2::zeros((0, sequence_length)),
            identity: Array2::zeros((0, num_entities)),
            future:   Array2::zeros((0, future_steps)),
        }
    }

    pub fn len(&self) -> usize             { self.past.nrows() }
    pub fn is_empty(&self) -> bool         { self.len() == 0 }
    pub fn sequence_length(&self) -> usize { self.past.ncols() }
    pub fn num_entities(&self) -> usize    { self.identity.ncols() }
    pub fn future_steps(&self) -> usize    { self.future.ncols() }

    pub fn past(&self) -> &Array2<f32>     { &self.past }
    pub fn identity(&self) -> &Array2<f32> { &self.identity }
    pub fn future(&self) -> &Array2<f32>   { &self.future }

    /// Row `index` as an owned sample
    pub fn sample(&self, index: usize) -> Option<WindowSample> {
        if index >= self.len() {
            return None;
        }
        Some(WindowSample {
            past:     self.past.row(index).to_vec(),
            identity: self.identity.row(index).to_vec(),
            future:   self.future.row(index).to_vec(),
        })
    }

    /// Check column counts against the geometry the model expects.
    pub fn check_shape(
        &self,
        sequence_length: usize,
        num_entities:    usize,
        future_steps:    usize,
    ) -> Result<(), PipelineError> {
        if self.sequence_length() != sequence_length {
            return Err(PipelineError::WidthMismatch {
                name:     "past window",
                expected: sequence_length,
                found:    self.sequence_length(),
            });
        }
        if self.num_entities() != num_entities {
            return Err(PipelineError::IdentityWidthMismatch {
                expected: num_entities,
                found:    self.num_entities(),
            });
        }
        if self.future_steps() != future_steps {
            return Err(PipelineError::WidthMismatch {
                name:     "future window",
                expected: future_steps,
                found:    self.future_steps(),
            });
        }
        Ok(())
    }
}

/// Burn dataset over one split's window arrays.
pub struct WindowDataset {
    tensors: WindowTensors,
}

impl WindowDataset {
    pub fn new(tensors: WindowTensors) -> Self { Self { tensors } }
}

impl Dataset<WindowSample> for WindowDataset {
    fn get(&self, index: usize) -> Option<WindowSample> {
        self.tensors.sample(index)
    }

    fn len(&self) -> usize {
        self.tensors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_row_count_mismatch() {
        let err = WindowTensors::new(
            array![[0.1, 0.2], [0.3, 0.4]],
            array![[1.0, 0.0]],
            array![[0.5], [0.6]],
        );
        assert_eq!(
            err.err(),
            Some(PipelineError::RowCountMismatch { past: 2, identity: 1, future: 2 })
        );
    }

    #[test]
    fn test_dataset_rows() {
        let t = WindowTensors::new(
            array![[0.1, 0.2], [0.3, 0.4]],
            array![[1.0, 0.0], [0.0, 1.0]],
            array![[0.5], [0.6]],
        )
        .unwrap();
        let ds = WindowDataset::new(t);
        assert_eq!(ds.len(), 2);
        let s = ds.get(1).unwrap();
        assert_eq!(s.past, vec![0.3, 0.4]);
        assert_eq!(s.identity, vec![0.0, 1.0]);
        assert_eq!(s.future, vec![0.6]);
        assert!(ds.get(2).is_none());
    }

    #[test]
    fn test_check_shape() {
        let t = WindowTensors::empty(48, 3, 24);
        assert!(t.check_shape(48, 3, 24).is_ok());
        assert_eq!(
            t.check_shape(48, 5, 24),
            Err(PipelineError::IdentityWidthMismatch { expected: 5, found: 3 })
        );
        assert!(t.check_shape(12, 3, 24).is_err());
    }
}
