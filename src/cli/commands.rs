// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands and their flags:
//
//   train           fit (or resume) the model and log the run
//   build-fixtures  write the static test arrays once
//   predict         forecast the next window for one library
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{
    fixtures_use_case::FixturesConfig,
    train_use_case::TrainConfig,
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the forecaster on every library in the database
    Train(TrainArgs),

    /// Build the held-out test arrays from a frozen database
    BuildFixtures(FixturesArgs),

    /// Forecast the next window for one library
    Predict(PredictArgs),
}

/// Window geometry shared by `train` and `build-fixtures`.
/// Spans are raw chunk counts before sub-sampling.
#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    /// Chunks of history fed to the model
    #[arg(long, default_value_t = 288)]
    pub past_span: usize,

    /// Chunks to predict
    #[arg(long, default_value_t = 144)]
    pub future_span: usize,

    /// Keep every n-th chunk inside a window; must divide both spans
    #[arg(long, default_value_t = 6)]
    pub sampling_rate: usize,

    /// Step between consecutive window starts
    #[arg(long, default_value_t = 6)]
    pub window_stride: usize,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// SQLite database with the occupancy readings
    #[arg(long, default_value = "prisma/dev.db")]
    pub db_path: String,

    #[arg(long, default_value = "BibData")]
    pub table: String,

    /// Saved model directory; an existing model is resumed
    #[arg(long, default_value = "trend_prediction_model/base_model")]
    pub model_dir: String,

    #[arg(long, default_value = "trend_prediction_model/web_model")]
    pub web_model_dir: String,

    /// Directory holding the test_*.npy fixtures
    #[arg(long, default_value = "trend_prediction_model/utils")]
    pub fixtures_dir: String,

    /// Append-only CSV with one row per run
    #[arg(long, default_value = "trend_prediction_model/model_logging.csv")]
    pub log_path: String,

    #[command(flatten)]
    pub window: WindowArgs,

    /// Fraction of each library's series used for training
    #[arg(long, default_value_t = 0.8)]
    pub split_fraction: f64,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Upper bound; early stopping usually ends the run sooner
    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    /// Initial Adam step size
    #[arg(long, default_value_t = 0.01)]
    pub lr: f64,

    /// Epochs without validation improvement before stopping
    #[arg(long, default_value_t = 5)]
    pub stop_patience: usize,

    /// Epochs without improvement before the step size is reduced
    #[arg(long, default_value_t = 2)]
    pub lr_patience: usize,

    #[arg(long, default_value_t = 0.5)]
    pub lr_factor: f64,

    #[arg(long, default_value_t = 1e-5)]
    pub min_lr: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            db_path:        a.db_path,
            table:          a.table,
            model_dir:      a.model_dir,
            web_model_dir:  a.web_model_dir,
            fixtures_dir:   a.fixtures_dir,
            log_path:       a.log_path,
            past_span:      a.window.past_span,
            future_span:    a.window.future_span,
            sampling_rate:  a.window.sampling_rate,
            window_stride:  a.window.window_stride,
            split_fraction: a.split_fraction,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            stop_patience:  a.stop_patience,
            lr_patience:    a.lr_patience,
            lr_factor:      a.lr_factor,
            min_lr:         a.min_lr,
            seed:           a.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct FixturesArgs {
    /// Frozen database the test set is built from
    #[arg(long, default_value = "trend_prediction_model/utils/test_dataset.db")]
    pub test_db_path: String,

    #[arg(long, default_value = "BibData")]
    pub table: String,

    #[arg(long, default_value = "trend_prediction_model/utils")]
    pub fixtures_dir: String,

    #[command(flatten)]
    pub window: WindowArgs,
}

impl From<FixturesArgs> for FixturesConfig {
    fn from(a: FixturesArgs) -> Self {
        FixturesConfig {
            test_db_path:  a.test_db_path,
            table:         a.table,
            fixtures_dir:  a.fixtures_dir,
            past_span:     a.window.past_span,
            future_span:   a.window.future_span,
            sampling_rate: a.window.sampling_rate,
            window_stride: a.window.window_stride,
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Library name as stored in the database
    #[arg(long)]
    pub entity: String,

    #[arg(long, default_value = "trend_prediction_model/base_model")]
    pub model_dir: String,

    /// Read recent readings from here instead of the training database
    #[arg(long)]
    pub db_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use crate::cli::Cli;
    use super::*;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config() {
        let cli = Cli::try_parse_from(["occupancy-forecast", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        assert_eq!(TrainConfig::from(args), TrainConfig::default());
    }

    #[test]
    fn test_fixture_flags() {
        let cli = Cli::try_parse_from([
            "occupancy-forecast", "build-fixtures", "--past-span", "24", "--future-span", "12",
        ])
        .unwrap();
        let Commands::BuildFixtures(args) = cli.command else { panic!("expected build-fixtures") };
        let cfg = FixturesConfig::from(args);
        assert_eq!((cfg.past_span, cfg.future_span, cfg.sampling_rate), (24, 12, 6));
    }

    #[test]
    fn test_predict_requires_entity() {
        assert!(Cli::try_parse_from(["occupancy-forecast", "predict"]).is_err());
        let cli = Cli::try_parse_from(["occupancy-forecast", "predict", "--entity", "A3"]).unwrap();
        let Commands::Predict(args) = cli.command else { panic!("expected predict") };
        assert_eq!(args.entity, "A3");
        assert!(args.db_path.is_none());
    }
}
