use burn::{
    nn::{
        gru::{Gru, GruConfig},
        loss::{MseLoss, Reduction},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
};

// #[derive(Config)] already generates Clone and Serialize/Deserialize;
// adding them again gives conflicting impls.
#[derive(Config, Debug, PartialEq)]
pub struct ForecasterConfig {
    /// Past points per window after sub-sampling
    pub sequence_length: usize,
    /// Width of the one-hot identity vector
    pub num_entities:    usize,
    /// Future points to predict
    pub future_steps:    usize,
    #[config(default = 64)]
    pub gru1_hidden:     usize,
    #[config(default = 32)]
    pub gru2_hidden:     usize,
    #[config(default = 128)]
    pub dense_hidden:    usize,
    #[config(default = 0.4)]
    pub dropout:         f64,
    /// Apply the reset gate before the candidate's hidden projection
    /// (`false`), the gate layout the exported web model expects
    #[config(default = false)]
    pub reset_after:     bool,
}

impl ForecasterConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ForecasterModel<B> {
        ForecasterModel {
            gru1:    GruConfig::new(1, self.gru1_hidden, true)
                .with_reset_after(self.reset_after)
                .init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            gru2:    GruConfig::new(self.gru1_hidden, self.gru2_hidden, true)
                .with_reset_after(self.reset_after)
                .init(device),
            dense:   LinearConfig::new(self.gru2_hidden + self.num_entities, self.dense_hidden).init(device),
            output:  LinearConfig::new(self.dense_hidden, self.future_steps).init(device),
        }
    }

    /// Whether weights saved under `other` fit this architecture
    pub fn same_shape(&self, other: &ForecasterConfig) -> bool {
        self.sequence_length == other.sequence_length
            && self.num_entities == other.num_entities
            && self.future_steps == other.future_steps
            && self.gru1_hidden == other.gru1_hidden
            && self.gru2_hidden == other.gru2_hidden
            && self.dense_hidden == other.dense_hidden
            && self.reset_after == other.reset_after
    }
}

/// Shared forecaster for every library:
///
///   past [B, T, 1] ─► GRU(64) ─► Dropout(0.4) ─► GRU(32) ─► last step [B, 32]
///                                                               │
///   identity [B, E] ────────────────────────────────────────► concat [B, 32+E]
///                                                               │
///                                        Dense(128, ReLU) ─► Linear(future_steps)
#[derive(Module, Debug)]
pub struct ForecasterModel<B: Backend> {
    pub gru1:    Gru<B>,
    pub dropout: Dropout,
    pub gru2:    Gru<B>,
    pub dense:   Linear<B>,
    pub output:  Linear<B>,
}

impl<B: Backend> ForecasterModel<B> {
    /// past: [batch, seq_len, 1], identity: [batch, num_entities]
    /// → predicted future window [batch, future_steps]
    pub fn forward(&self, past: Tensor<B, 3>, identity: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.gru1.forward(past, None);
        let x = self.dropout.forward(x);
        let x = self.gru2.forward(x, None); // [batch, seq_len, hidden]

        // Only the final hidden state feeds the head
        let [batch, seq_len, hidden] = x.dims();
        let last = x
            .slice([0..batch, seq_len - 1..seq_len, 0..hidden])
            .reshape([batch, hidden]);

        let combined = Tensor::cat(vec![last, identity], 1);
        let x = relu(self.dense.forward(combined));
        self.output.forward(x)
    }

    /// Forward pass plus mean-squared error against `targets`.
    pub fn forward_loss(
        &self,
        past:     Tensor<B, 3>,
        identity: Tensor<B, 2>,
        targets:  Tensor<B, 2>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let output = self.forward(past, identity);
        let loss   = MseLoss::new().forward(output.clone(), targets, Reduction::Mean);
        (loss, output)
    }
}

/// Mean absolute error over every element
pub fn mean_absolute_error<B: Backend>(output: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    (output - targets).abs().mean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::InferBackend;

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model: ForecasterModel<InferBackend> = ForecasterConfig::new(8, 3, 4).init(&device);

        let past     = Tensor::<InferBackend, 3>::zeros([5, 8, 1], &device);
        let identity = Tensor::<InferBackend, 2>::zeros([5, 3], &device);
        let out      = model.forward(past, identity);
        assert_eq!(out.dims(), [5, 4]);
    }

    #[test]
    fn test_default_architecture() {
        let cfg = ForecasterConfig::new(48, 5, 24);
        assert_eq!(cfg.gru1_hidden, 64);
        assert_eq!(cfg.gru2_hidden, 32);
        assert_eq!(cfg.dense_hidden, 128);
        assert_eq!(cfg.dropout, 0.4);
        assert!(!cfg.reset_after);
        assert!(cfg.same_shape(&ForecasterConfig::new(48, 5, 24)));
        assert!(!cfg.same_shape(&ForecasterConfig::new(48, 6, 24)));
    }

    #[test]
    fn test_gate_layout_is_part_of_the_architecture() {
        let cfg = ForecasterConfig::new(48, 5, 24);
        assert!(!cfg.same_shape(&ForecasterConfig::new(48, 5, 24).with_reset_after(true)));

        let device = Default::default();
        let model: ForecasterModel<InferBackend> = cfg.with_reset_after(true).init(&device);
        let out = model.forward(
            Tensor::<InferBackend, 3>::zeros([2, 48, 1], &device),
            Tensor::<InferBackend, 2>::zeros([2, 5], &device),
        );
        assert_eq!(out.dims(), [2, 24]);
    }

    #[test]
    fn test_mae() {
        let device = Default::default();
        let a = Tensor::<InferBackend, 2>::from_floats([[0.0, 1.0], [0.5, 0.5]], &device);
        let b = Tensor::<InferBackend, 2>::from_floats([[0.5, 1.0], [0.5, 0.0]], &device);
        let mae: f32 = mean_absolute_error(a, b).into_scalar().elem();
        assert!((mae - 0.25).abs() < 1e-6);
    }
}
