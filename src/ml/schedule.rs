// ============================================================
// Layer 5 — Training Schedule
// ============================================================
// Two callbacks driven by the validation loss at the end of each
// epoch, kept free of any tensor code:
//
//   EarlyStopping     stops after `patience` epochs without an
//                     improvement and remembers the best epoch so
//                     the trainer can restore those parameters
//
//   PlateauScheduler  multiplies the step size by `factor` after
//                     `patience` epochs without an improvement of
//                     at least `min_delta`, floored at `min_lr`
//
// A NaN loss never counts as an improvement.
//
// Reference: Prechelt (1998) Early Stopping, But When?

/// Outcome of feeding one validation loss to `EarlyStopping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    /// New best; the caller should snapshot the parameters
    Improved,
    /// No improvement yet, keep going
    Continue,
    /// Patience exhausted
    Stop,
}

#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience:   usize,
    min_delta:  f64,
    best:       f64,
    best_epoch: usize,
    wait:       usize,
}

impl EarlyStopping {
    pub fn new(patience: usize, min_delta: f64) -> Self {
        Self { patience, min_delta, best: f64::INFINITY, best_epoch: 0, wait: 0 }
    }

    pub fn observe(&mut self, epoch: usize, val_loss: f64) -> StopSignal {
        if val_loss < self.best - self.min_delta {
            self.best       = val_loss;
            self.best_epoch = epoch;
            self.wait       = 0;
            return StopSignal::Improved;
        }

        self.wait += 1;
        if self.wait >= self.patience {
            StopSignal::Stop
        } else {
            StopSignal::Continue
        }
    }

    pub fn best(&self) -> f64 {
        self.best
    }

    /// Epoch of the best loss, 0 before any improvement
    pub fn best_epoch(&self) -> usize {
        self.best_epoch
    }
}

#[derive(Debug, Clone)]
pub struct PlateauScheduler {
    lr:        f64,
    factor:    f64,
    patience:  usize,
    min_lr:    f64,
    min_delta: f64,
    best:      f64,
    wait:      usize,
}

impl PlateauScheduler {
    pub fn new(initial_lr: f64, factor: f64, patience: usize, min_lr: f64) -> Self {
        Self {
            lr: initial_lr,
            factor,
            patience,
            min_lr,
            min_delta: 1e-4,
            best: f64::INFINITY,
            wait: 0,
        }
    }

    /// Current step size
    pub fn lr(&self) -> f64 {
        self.lr
    }

    /// Record one validation loss; returns the step size for the
    /// next epoch.
    pub fn observe(&mut self, val_loss: f64) -> f64 {
        if val_loss < self.best - self.min_delta {
            self.best = val_loss;
            self.wait = 0;
            return self.lr;
        }

        self.wait += 1;
        if self.wait >= self.patience && self.lr > self.min_lr {
            let reduced = (self.lr * self.factor).max(self.min_lr);
            tracing::info!("Reducing learning rate {:.2e} -> {:.2e}", self.lr, reduced);
            self.lr   = reduced;
            self.wait = 0;
        }
        self.lr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_early_stopping_waits_for_patience() {
        let mut es = EarlyStopping::new(3, 0.0);
        assert_eq!(es.observe(1, 1.0), StopSignal::Improved);
        assert_eq!(es.observe(2, 0.5), StopSignal::Improved);
        assert_eq!(es.observe(3, 0.6), StopSignal::Continue);
        assert_eq!(es.observe(4, 0.5), StopSignal::Continue); // equal is not better
        assert_eq!(es.observe(5, 0.7), StopSignal::Stop);
        assert_eq!(es.best_epoch(), 2);
        assert_eq!(es.best(), 0.5);
    }

    #[test]
    fn test_early_stopping_resets_on_improvement() {
        let mut es = EarlyStopping::new(2, 0.0);
        es.observe(1, 1.0);
        assert_eq!(es.observe(2, 1.1), StopSignal::Continue);
        assert_eq!(es.observe(3, 0.9), StopSignal::Improved);
        assert_eq!(es.observe(4, 1.0), StopSignal::Continue);
        assert_eq!(es.observe(5, 1.0), StopSignal::Stop);
        assert_eq!(es.best_epoch(), 3);
    }

    #[test]
    fn test_nan_is_never_an_improvement() {
        let mut es = EarlyStopping::new(1, 0.0);
        assert_eq!(es.observe(1, f64::NAN), StopSignal::Stop);
        assert_eq!(es.best_epoch(), 0);

        let mut sched = PlateauScheduler::new(0.01, 0.5, 1, 1e-5);
        assert_eq!(sched.observe(f64::NAN), 0.005);
    }

    #[test]
    fn test_plateau_halves_after_patience() {
        let mut sched = PlateauScheduler::new(0.01, 0.5, 2, 1e-5);
        assert_eq!(sched.observe(1.0), 0.01);
        assert_eq!(sched.observe(1.0), 0.01);
        assert_eq!(sched.observe(1.0), 0.005);
        // wait resets after a reduction
        assert_eq!(sched.observe(1.0), 0.005);
        assert_eq!(sched.observe(1.0), 0.0025);
    }

    #[test]
    fn test_plateau_ignores_tiny_improvements() {
        let mut sched = PlateauScheduler::new(0.01, 0.5, 2, 1e-5);
        sched.observe(1.0);
        sched.observe(0.99995);
        assert_eq!(sched.observe(0.99991), 0.005);
    }

    #[test]
    fn test_plateau_floors_at_min_lr() {
        let mut sched = PlateauScheduler::new(3e-5, 0.5, 1, 1e-5);
        sched.observe(1.0);
        assert_eq!(sched.observe(1.0), 1.5e-5);
        assert_eq!(sched.observe(1.0), 1e-5);
        assert_eq!(sched.observe(1.0), 1e-5);
        assert_eq!(sched.lr(), 1e-5);
    }
}
