// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// `clap` and delegates every command to Layer 2.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, FixturesArgs, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "occupancy-forecast",
    version = "0.1.0",
    about = "Train a shared GRU model on library occupancy and forecast the next hours."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand; no computation happens here.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)         => run_train(args),
            Commands::BuildFixtures(args) => run_build_fixtures(args),
            Commands::Predict(args)       => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}'", args.db_path);
    let report = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Training complete ({}, {} epochs, best epoch {}{}).",
        if report.resumed { "resumed" } else { "fresh model" },
        report.epochs_run,
        report.best_epoch,
        if report.stopped_early { ", stopped early" } else { "" },
    );
    println!(
        "Validation loss {} | validation MAE {}% | test MAE {}% | peak {} MB | {} min",
        report.run.val_loss,
        report.run.val_mae_pct,
        report.run.test_mae_pct,
        report.run.peak_memory_mb,
        report.run.duration_min,
    );
    Ok(())
}

fn run_build_fixtures(args: FixturesArgs) -> Result<()> {
    use crate::application::fixtures_use_case::FixturesUseCase;

    let dir = args.fixtures_dir.clone();
    let summary = FixturesUseCase::new(args.into()).execute()?;
    println!(
        "Wrote {} test windows to '{}' (past {}, entities {}, future {}).",
        summary.windows, dir, summary.sequence_length, summary.num_entities, summary.future_steps,
    );
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let forecast = PredictUseCase::new(args.model_dir, args.db_path).forecast(&args.entity)?;
    println!("Forecast for '{}':", forecast.entity);
    for (step, (scaled, pct)) in forecast.scaled.iter().zip(&forecast.percentages).enumerate() {
        println!("  t+{:<3} {:>6.3}  {:>6.1}%", step + 1, scaled, pct);
    }
    Ok(())
}
