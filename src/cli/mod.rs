// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap, builds a ServiceConfig, and hands off to Layer 2.
// All business logic lives in the PredictionService.
//
// Output formatting (currency, percentages) lives here too;
// no other layer prints.

pub mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, PredictArgs, SeedArgs, StoreArgs, TrainArgs};

use crate::application::config::{ConfigOverrides, ServiceConfig};
use crate::application::prediction_service::PredictionService;
use crate::data::loader::{seed_examples, write_corpus};
use crate::domain::housing::PredictionInput;
use crate::infra::metrics::MetricsLogger;

#[derive(Parser, Debug)]
#[command(
    name = "house-price-predictor",
    version,
    about = "Train a small neural network on house sales, then price new houses."
)]
pub struct Cli {
    /// Optional JSON config file; CLI flags override its values
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level (per-epoch loss, artifact I/O)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching handler. The CLI only routes and prints.
    pub async fn run(self) -> Result<()> {
        let base = ServiceConfig::load_or_default(self.config.as_deref())?;
        match self.command {
            Commands::Train(args)    => run_train(base, args).await,
            Commands::Predict(args)  => run_predict(base, args).await,
            Commands::Status(args)   => run_status(base, args).await,
            Commands::Evaluate(args) => run_evaluate(base, args).await,
            Commands::Seed(args)     => run_seed(args),
        }
    }
}

fn configure(base: ServiceConfig, overrides: ConfigOverrides) -> Result<ServiceConfig> {
    let config = base.with_overrides(overrides);
    config.validate()?;
    Ok(config)
}

async fn run_train(base: ServiceConfig, args: TrainArgs) -> Result<()> {
    let config  = configure(base, ConfigOverrides::from(&args))?;
    let service = PredictionService::from_config(&config);

    tracing::info!("Training from corpus '{}'", config.corpus_path.display());
    let summary = service.train_new_model().await?;

    if let Some(path) = &args.metrics_csv {
        MetricsLogger::new(path)?.log_all(&summary.history)?;
        println!("Per-epoch losses written to '{}'", path.display());
    }

    println!(
        "Trained on {} examples. Final loss: {:.6}. Model saved to '{}'.",
        summary.examples,
        summary.final_loss,
        config.artifact_dir.display()
    );
    Ok(())
}

async fn run_predict(base: ServiceConfig, args: PredictArgs) -> Result<()> {
    let config  = configure(base, args.store.into())?;
    let service = PredictionService::from_config(&config);

    let input  = PredictionInput::new(args.square_footage, args.bedrooms);
    let result = service.predict(input).await?;
    service.flush_logs().await;

    println!("Estimated price: {}", format_currency(result.price));
    println!("Confidence:      {:.1}%", result.confidence * 100.0);
    Ok(())
}

async fn run_status(base: ServiceConfig, args: StoreArgs) -> Result<()> {
    let config  = configure(base, args.into())?;
    let service = PredictionService::from_config(&config);

    // A stored artifact that fails to load still gets reported
    if let Err(e) = service.load_stored().await {
        tracing::warn!("Stored model could not be loaded: {e}");
    }
    let status = serde_json::to_string_pretty(&service.status())?;
    println!("{status}");
    Ok(())
}

async fn run_evaluate(base: ServiceConfig, args: StoreArgs) -> Result<()> {
    let config  = configure(base, args.into())?;
    let service = PredictionService::from_config(&config);

    let mse = service.evaluate().await?;
    println!("Mean squared error (normalized): {mse:.6}");
    Ok(())
}

fn run_seed(args: SeedArgs) -> Result<()> {
    let rows = seed_examples();
    write_corpus(&args.out, &rows)
        .with_context(|| format!("Seeding '{}' failed", args.out.display()))?;
    println!("Wrote {} training examples to '{}'", rows.len(), args.out.display());
    Ok(())
}

/// US-dollar rendering with thousands separators: `$337,500.00`.
pub fn format_currency(amount: f64) -> String {
    let cents   = (amount.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}
