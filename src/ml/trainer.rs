// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop using Burn's DataLoader and Adam.
//
//   - Training runs on an AutodiffBackend so gradients exist
//   - model.valid() drops to the inner backend (dropout off)
//     for validation and evaluation
//   - Training batches are shuffled with a fixed seed, the
//     validation and test sets are not
//   - Loss and MAE are sample-weighted means, so a short last
//     batch counts for exactly its size
//
// After every epoch the validation loss feeds EarlyStopping and
// PlateauScheduler. The parameters of the best epoch are always
// restored before returning.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::sync::Arc;

use anyhow::Result;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{
    batcher::{WindowBatch, WindowBatcher},
    dataset::{WindowDataset, WindowTensors},
};
use crate::domain::error::PipelineError;
use crate::infra::metrics::EpochMetrics;
use crate::ml::model::{mean_absolute_error, ForecasterModel};
use crate::ml::schedule::{EarlyStopping, PlateauScheduler, StopSignal};

/// Optimisation settings for one `fit` call.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub max_epochs:     usize,
    pub batch_size:     usize,
    pub learning_rate:  f64,
    pub stop_patience:  usize,
    pub lr_patience:    usize,
    pub lr_factor:      f64,
    pub min_lr:         f64,
    pub seed:           u64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_epochs:    100,
            batch_size:    32,
            learning_rate: 0.01,
            stop_patience: 5,
            lr_patience:   2,
            lr_factor:     0.5,
            min_lr:        1e-5,
            seed:          42,
        }
    }
}

/// Loss (MSE) and mean absolute error over a whole set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalMetrics {
    pub loss: f64,
    pub mae:  f64,
}

pub struct FitOutcome<B: AutodiffBackend> {
    /// Parameters of the best validation epoch
    pub model:         ForecasterModel<B>,
    pub history:       Vec<EpochMetrics>,
    /// 1-based, 0 when no epoch improved on the initial loss
    pub best_epoch:    usize,
    pub stopped_early: bool,
}

/// Running sums for sample-weighted means.
#[derive(Debug, Default)]
struct Accumulator {
    loss_sum: f64,
    mae_sum:  f64,
    samples:  usize,
}

impl Accumulator {
    fn add(&mut self, loss: f64, mae: f64, n: usize) {
        self.loss_sum += loss * n as f64;
        self.mae_sum  += mae * n as f64;
        self.samples  += n;
    }

    fn finish(&self) -> EvalMetrics {
        if self.samples == 0 {
            return EvalMetrics { loss: f64::NAN, mae: f64::NAN };
        }
        EvalMetrics {
            loss: self.loss_sum / self.samples as f64,
            mae:  self.mae_sum / self.samples as f64,
        }
    }
}

pub fn fit<B: AutodiffBackend>(
    cfg:    &FitConfig,
    model:  ForecasterModel<B>,
    train:  WindowTensors,
    val:    WindowTensors,
    device: &B::Device,
) -> Result<FitOutcome<B>> {
    if cfg.batch_size == 0 {
        return Err(PipelineError::ZeroParameter("batch_size").into());
    }
    if train.is_empty() {
        return Err(PipelineError::EmptyDataset("training").into());
    }
    if val.is_empty() {
        return Err(PipelineError::EmptyDataset("validation").into());
    }

    B::seed(cfg.seed);
    tracing::info!(
        "Fitting on {} train / {} validation windows, batch size {}",
        train.len(), val.len(), cfg.batch_size
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new().with_epsilon(1e-7).init();

    let train_loader = DataLoaderBuilder::new(WindowBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(WindowDataset::new(train));

    // Validation runs on the inner backend, no autodiff overhead
    let val_loader = DataLoaderBuilder::new(WindowBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(WindowDataset::new(val));

    let mut model      = model;
    let mut best_model = None;
    let mut stopper    = EarlyStopping::new(cfg.stop_patience, 0.0);
    let mut scheduler  = PlateauScheduler::new(cfg.learning_rate, cfg.lr_factor, cfg.lr_patience, cfg.min_lr);
    let mut history    = Vec::new();
    let mut stopped_early = false;

    for epoch in 1..=cfg.max_epochs {
        let lr = scheduler.lr();

        // ── Training phase ────────────────────────────────────────────────────
        let mut acc = Accumulator::default();
        for batch in train_loader.iter() {
            let n = batch.future.dims()[0];
            let (loss, output) = model.forward_loss(batch.past, batch.identity, batch.future.clone());

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            let mae_val:  f64 = mean_absolute_error(output.detach(), batch.future)
                .into_scalar()
                .elem::<f64>();
            acc.add(loss_val, mae_val, n);

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);
        }
        let train_metrics = acc.finish();

        // ── Validation phase ──────────────────────────────────────────────────
        let val_metrics = evaluate_loader(&model.valid(), &val_loader);

        let metrics = EpochMetrics::new(
            epoch,
            train_metrics.loss,
            train_metrics.mae,
            val_metrics.loss,
            val_metrics.mae,
            lr,
        );
        println!(
            "Epoch {:>3}/{} | loss={:.4} | mae={:.4} | val_loss={:.4} | val_mae={:.4} | lr={:.1e}",
            epoch, cfg.max_epochs,
            metrics.train_loss, metrics.train_mae,
            metrics.val_loss, metrics.val_mae, lr,
        );
        history.push(metrics);

        scheduler.observe(val_metrics.loss);
        match stopper.observe(epoch, val_metrics.loss) {
            StopSignal::Improved => best_model = Some(model.clone()),
            StopSignal::Continue => {}
            StopSignal::Stop => {
                tracing::info!(
                    "Early stopping at epoch {} (best epoch {}, val_loss={:.4})",
                    epoch, stopper.best_epoch(), stopper.best()
                );
                stopped_early = true;
                break;
            }
        }
    }

    if let Some(best) = best_model {
        tracing::info!("Restoring parameters from epoch {}", stopper.best_epoch());
        model = best;
    }

    Ok(FitOutcome {
        model,
        history,
        best_epoch: stopper.best_epoch(),
        stopped_early,
    })
}

/// Loss and MAE of `model` over `data`, in order, no gradients.
pub fn evaluate<B: Backend>(
    model:      &ForecasterModel<B>,
    data:       WindowTensors,
    batch_size: usize,
    device:     &B::Device,
) -> Result<EvalMetrics> {
    if batch_size == 0 {
        return Err(PipelineError::ZeroParameter("batch_size").into());
    }
    if data.is_empty() {
        return Err(PipelineError::EmptyDataset("evaluation").into());
    }
    let loader = DataLoaderBuilder::new(WindowBatcher::<B>::new(device.clone()))
        .batch_size(batch_size)
        .num_workers(1)
        .build(WindowDataset::new(data));
    Ok(evaluate_loader(model, &loader))
}

fn evaluate_loader<B: Backend>(
    model:  &ForecasterModel<B>,
    loader: &Arc<dyn DataLoader<B, WindowBatch<B>>>,
) -> EvalMetrics {
    let mut acc = Accumulator::default();
    for batch in loader.iter() {
        let n = batch.future.dims()[0];
        let (loss, output) = model.forward_loss(batch.past, batch.identity, batch.future.clone());
        let loss_val: f64 = loss.into_scalar().elem::<f64>();
        let mae_val:  f64 = mean_absolute_error(output, batch.future).into_scalar().elem::<f64>();
        acc.add(loss_val, mae_val, n);
    }
    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::ForecasterConfig;
    use crate::ml::{InferBackend, TrainBackend};
    use ndarray::Array2;

    fn toy_tensors(n: usize, seq: usize, ents: usize, fut: usize) -> WindowTensors {
        let past     = Array2::from_shape_fn((n, seq), |(i, j)| ((i + j) % 10) as f32 / 10.0);
        let identity = Array2::from_shape_fn((n, ents), |(i, j)| if i % ents == j { 1.0 } else { 0.0 });
        let future   = Array2::from_shape_fn((n, fut), |(i, j)| ((i + seq + j) % 10) as f32 / 10.0);
        WindowTensors::new(past, identity, future).unwrap()
    }

    #[test]
    fn test_accumulator_weights_by_samples() {
        let mut acc = Accumulator::default();
        acc.add(1.0, 0.5, 3);
        acc.add(0.0, 0.0, 1);
        let m = acc.finish();
        assert!((m.loss - 0.75).abs() < 1e-12);
        assert!((m.mae - 0.375).abs() < 1e-12);
        assert!(Accumulator::default().finish().loss.is_nan());
    }

    #[test]
    fn test_fit_runs_and_tracks_history() {
        let device = Default::default();
        let model: ForecasterModel<TrainBackend> = ForecasterConfig::new(6, 2, 3).init(&device);
        let cfg = FitConfig { max_epochs: 2, batch_size: 4, ..FitConfig::default() };

        let outcome = fit(&cfg, model, toy_tensors(10, 6, 2, 3), toy_tensors(5, 6, 2, 3), &device).unwrap();

        assert_eq!(outcome.history.len(), 2);
        assert!(outcome.best_epoch >= 1 && outcome.best_epoch <= 2);
        assert!(!outcome.stopped_early);
        assert!(outcome.history.iter().all(|m| m.val_loss.is_finite()));
        assert_eq!(outcome.history[0].lr, 0.01);
    }

    /// Same inputs, opposite targets: every step that fits the
    /// training set (+5) moves the validation outputs away from -5.
    fn diverging_sets() -> (WindowTensors, WindowTensors) {
        let base = toy_tensors(8, 6, 2, 3);
        let with_target = |target: f32| {
            WindowTensors::new(
                base.past().clone(),
                base.identity().clone(),
                Array2::from_elem((8, 3), target),
            )
            .unwrap()
        };
        (with_target(5.0), with_target(-5.0))
    }

    #[test]
    fn test_fit_stops_reduces_lr_and_restores_best() {
        let device = Default::default();
        let model: ForecasterModel<TrainBackend> =
            ForecasterConfig::new(6, 2, 3).with_dropout(0.0).init(&device);
        let cfg = FitConfig {
            max_epochs:    30,
            batch_size:    4,
            learning_rate: 1e-3,
            stop_patience: 2,
            lr_patience:   1,
            ..FitConfig::default()
        };
        let (train, val) = diverging_sets();

        let outcome = fit(&cfg, model, train, val.clone(), &device).unwrap();
        let history = &outcome.history;

        assert!(outcome.stopped_early);
        assert!(history.len() < cfg.max_epochs);
        assert!(history.iter().any(|m| m.lr < history[0].lr));

        let (best_index, best) = history
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.val_loss.total_cmp(&b.1.val_loss))
            .unwrap();
        assert_eq!(outcome.best_epoch, best_index + 1);
        assert!(best_index + 1 < history.len());

        // The returned parameters are the best epoch's, not the last
        let restored = evaluate(&outcome.model.valid(), val, cfg.batch_size, &device).unwrap();
        let tolerance = 1e-5 * best.val_loss.abs().max(1.0);
        assert!((restored.loss - best.val_loss).abs() < tolerance);
        assert!((restored.loss - history[history.len() - 1].val_loss).abs() > tolerance);
    }

    #[test]
    fn test_fit_rejects_empty_sets() {
        let device = Default::default();
        let model: ForecasterModel<TrainBackend> = ForecasterConfig::new(6, 2, 3).init(&device);
        let err = fit(
            &FitConfig::default(),
            model,
            WindowTensors::empty(6, 2, 3),
            toy_tensors(5, 6, 2, 3),
            &device,
        )
        .err()
        .unwrap();
        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::EmptyDataset("training"))
        );
    }

    #[test]
    fn test_evaluate_matches_single_batch() {
        let device = Default::default();
        let model: ForecasterModel<InferBackend> = ForecasterConfig::new(6, 2, 3).init(&device);
        let data = toy_tensors(7, 6, 2, 3);

        let small = evaluate(&model, data.clone(), 2, &device).unwrap();
        let whole = evaluate(&model, data, 7, &device).unwrap();
        assert!((small.loss - whole.loss).abs() < 1e-5);
        assert!((small.mae - whole.mae).abs() < 1e-5);
    }
}
