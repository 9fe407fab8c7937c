// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands and their flags:
//
//   train     — fit a new model on the corpus and store it
//   predict   — price one house
//   status    — print the service status as JSON
//   evaluate  — MSE of the stored model over the corpus
//   seed      — write the built-in example rows to a corpus file
//
// Path and training flags are optional; anything not given on
// the command line falls back to the config file, then to the
// built-in defaults.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::config::ConfigOverrides;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a new model on the corpus and make it the stored model
    Train(TrainArgs),

    /// Predict the price of a house
    Predict(PredictArgs),

    /// Show whether a model is stored and loadable
    Status(StoreArgs),

    /// Report the stored model's MSE over the corpus
    Evaluate(StoreArgs),

    /// Write the built-in seed rows to a corpus file
    Seed(SeedArgs),
}

/// Where the service reads and writes. Shared by most commands.
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Directory holding the model artifact
    #[arg(long)]
    pub artifact_dir: Option<PathBuf>,

    /// JSON corpus of training examples
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// JSONL file that served predictions are appended to
    #[arg(long)]
    pub prediction_log: Option<PathBuf>,

    /// Keep artifacts in memory only (nothing is written to disk)
    #[arg(long)]
    pub in_memory: bool,
}

impl From<StoreArgs> for ConfigOverrides {
    fn from(a: StoreArgs) -> Self {
        ConfigOverrides {
            artifact_dir:        a.artifact_dir,
            corpus_path:         a.corpus,
            prediction_log_path: a.prediction_log,
            in_memory_store:     a.in_memory,
            ..Default::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Number of full passes over the training rows
    #[arg(long)]
    pub epochs: Option<usize>,

    /// Rows per gradient step
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Fraction of rows held out for validation, in [0, 1)
    #[arg(long)]
    pub validation_split: Option<f64>,

    /// Also write per-epoch losses to this CSV file
    #[arg(long)]
    pub metrics_csv: Option<PathBuf>,
}

/// Training flags layered over the path flags.
impl From<&TrainArgs> for ConfigOverrides {
    fn from(a: &TrainArgs) -> Self {
        ConfigOverrides {
            epochs:           a.epochs,
            batch_size:       a.batch_size,
            validation_split: a.validation_split,
            ..ConfigOverrides::from(a.store.clone())
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Living area in square feet (0 < x <= 10000)
    #[arg(long)]
    pub square_footage: f64,

    /// Number of bedrooms (whole number, 1..=10)
    #[arg(long)]
    pub bedrooms: f64,
}

#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Where to write the corpus
    #[arg(long, default_value = "data/training_data.json")]
    pub out: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_args_keep_path_flags() {
        let args = TrainArgs {
            store: StoreArgs { corpus: Some("rows.json".into()), ..Default::default() },
            epochs:           Some(3),
            batch_size:       None,
            validation_split: Some(0.0),
            metrics_csv:      None,
        };
        let o = ConfigOverrides::from(&args);
        assert_eq!(o.corpus_path, Some(PathBuf::from("rows.json")));
        assert_eq!(o.epochs, Some(3));
        assert_eq!(o.batch_size, None);
        assert_eq!(o.validation_split, Some(0.0));
        assert!(!o.in_memory_store);
    }
}
