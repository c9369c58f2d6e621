// ============================================================
// Layer 6 — Run Log
// ============================================================
// Appends one row per training run to a CSV file. The file is
// created with its header on first use and rows are never
// rewritten, so the log is a permanent history of every run.
//
// Columns and rounding:
//   Timestamp                 local time, "YYYY-MM-DD @ HH:MM:SS"
//   Data Size (rows)          deduplicated input rows
//   Memory Peak Usage (MB)    2 decimals
//   Training Duration (m)     whole seconds / 60, 2 decimals
//   Validation Loss           3 decimals
//   Validation MAE (%)        2 decimals
//   Test MAE (%)              2 decimals
//
// Example:
//   2024-05-02 @ 14:03:11,86400,412.5,7.35,0.006,5.12,6.03
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::domain::round_to;

pub const LOG_HEADER: &str = "Timestamp,Data Size (rows),Memory Peak Usage (MB),\
Training Duration (m),Validation Loss,Validation MAE (%),Test MAE (%)";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d @ %H:%M:%S";

/// Metrics of one training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch: usize,
    pub train_loss: f64,
    pub train_mae: f64,
    pub val_loss: f64,
    pub val_mae: f64,
    /// Step size used during this epoch
    pub lr: f64,
}

impl EpochMetrics {
    pub fn new(
        epoch:      usize,
        train_loss: f64,
        train_mae:  f64,
        val_loss:   f64,
        val_mae:    f64,
        lr:         f64,
    ) -> Self {
        Self { epoch, train_loss, train_mae, val_loss, val_mae, lr }
    }
}

/// One finished training run, already rounded for the log.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRun {
    pub timestamp:      DateTime<Local>,
    pub data_size:      usize,
    pub peak_memory_mb: f64,
    pub duration_min:   f64,
    pub val_loss:       f64,
    pub val_mae_pct:    f64,
    pub test_mae_pct:   f64,
}

impl TrainingRun {
    /// `val_mae` and `test_mae` are fractions on the scaled [0, 1]
    /// range; they are logged as percentages.
    pub fn new(
        data_size:      usize,
        peak_memory_mb: f64,
        duration:       Duration,
        val_loss:       f64,
        val_mae:        f64,
        test_mae:       f64,
    ) -> Self {
        Self {
            timestamp:      Local::now(),
            data_size,
            peak_memory_mb: round_to(peak_memory_mb, 2),
            duration_min:   round_to(duration.as_secs() as f64 / 60.0, 2),
            val_loss:       round_to(val_loss, 3),
            val_mae_pct:    round_to(val_mae * 100.0, 2),
            test_mae_pct:   round_to(test_mae * 100.0, 2),
        }
    }

    /// Floats always carry a decimal point (`1.0`, not `1`), matching
    /// rows already written to existing logs.
    fn to_csv_row(&self) -> String {
        format!(
            "{},{},{:?},{:?},{:?},{:?},{:?}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.data_size,
            self.peak_memory_mb,
            self.duration_min,
            self.val_loss,
            self.val_mae_pct,
            self.test_mae_pct,
        )
    }
}

/// Append-only CSV of training runs.
pub struct RunRecorder {
    csv_path: PathBuf,
}

impl RunRecorder {
    /// Open the log, creating it (and its directory) with the
    /// header row if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let csv_path = path.as_ref().to_path_buf();

        if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create run log '{}'", csv_path.display()))?;
            writeln!(f, "{LOG_HEADER}")?;
            tracing::info!("Created run log '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn append(&self, run: &TrainingRun) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open run log '{}'", self.csv_path.display()))?;

        writeln!(f, "{}", run.to_csv_row())?;

        tracing::debug!(
            "Logged run: val_loss={}, val_mae={}%, test_mae={}%",
            run.val_loss, run.val_mae_pct, run.test_mae_pct,
        );
        Ok(())
    }
}
