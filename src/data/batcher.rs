// ============================================================
// Layer 4 — Window Batcher
// ============================================================
// Implements Burn's Batcher trait to stack WindowSamples into
// tensors for one forward pass.
//
// Input:  Vec of N WindowSamples
// Output: WindowBatch with
//   past     [N, sequence_length, 1]  (one feature per step)
//   identity [N, num_entities]
//   future   [N, future_steps]
//
// Every sample in a split has the same widths, so the batch is
// a flatten-then-reshape with no padding.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::WindowSample;

#[derive(Debug, Clone)]
pub struct WindowBatch<B: Backend> {
    pub past:     Tensor<B, 3>,
    pub identity: Tensor<B, 2>,
    pub future:   Tensor<B, 2>,
}

#[derive(Clone, Debug)]
pub struct WindowBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> WindowBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<B, WindowSample, WindowBatch<B>> for WindowBatcher<B> {
    fn batch(&self, items: Vec<WindowSample>, _device: &B::Device) -> WindowBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map_or(0, |s| s.past.len());
        let n_entities = items.first().map_or(0, |s| s.identity.len());
        let horizon    = items.first().map_or(0, |s| s.future.len());

        let past_flat: Vec<f32> = items.iter().flat_map(|s| s.past.iter().copied()).collect();
        let id_flat:   Vec<f32> = items.iter().flat_map(|s| s.identity.iter().copied()).collect();
        let fut_flat:  Vec<f32> = items.iter().flat_map(|s| s.future.iter().copied()).collect();

        let past = Tensor::<B, 1>::from_floats(past_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len, 1]);
        let identity = Tensor::<B, 1>::from_floats(id_flat.as_slice(), &self.device)
            .reshape([batch_size, n_entities]);
        let future = Tensor::<B, 1>::from_floats(fut_flat.as_slice(), &self.device)
            .reshape([batch_size, horizon]);

        WindowBatch { past, identity, future }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::InferBackend;

    #[test]
    fn test_batch_shapes() {
        let device  = Default::default();
        let batcher = WindowBatcher::<InferBackend>::new(device);
        let device  = batcher.device.clone();
        let items = vec![
            WindowSample { past: vec![0.1, 0.2, 0.3, 0.4], identity: vec![1.0, 0.0, 0.0], future: vec![0.5, 0.6] },
            WindowSample { past: vec![0.4, 0.3, 0.2, 0.1], identity: vec![0.0, 0.0, 1.0], future: vec![0.7, 0.8] },
        ];
        let batch = batcher.batch(items, &device);

        assert_eq!(batch.past.dims(), [2, 4, 1]);
        assert_eq!(batch.identity.dims(), [2, 3]);
        assert_eq!(batch.future.dims(), [2, 2]);

        let fut: Vec<f32> = batch.future.into_data().to_vec().unwrap();
        assert_eq!(fut, vec![0.5, 0.6, 0.7, 0.8]);
    }
}
