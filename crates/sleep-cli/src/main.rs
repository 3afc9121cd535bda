//! sleep-quality - train and query the sleep-quality classifier
//!
//! Usage:
//!   sleep-quality train --data data/datasleep.csv --model-dir models
//!   sleep-quality predict --input person.json --threshold 65
//!   echo '{"sleep_duration": 7.5, "stress_level": 3}' | sleep-quality predict
//!   sleep-quality info --model-dir models

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

use commands::{info, predict, train};

/// sleep-quality - Good/Poor sleep classifier
///
/// Trains a class-balanced random forest on lifestyle measurements and
/// scores single records against the persisted model.
#[derive(Parser)]
#[command(name = "sleep-quality")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the pipeline on a CSV and write model.bin and meta.json
    Train {
        /// Training CSV
        #[arg(long, value_name = "FILE", env = "SLEEP_DATA_PATH", default_value = sleep_quality::trainer::DEFAULT_DATA_PATH)]
        data: PathBuf,

        /// Directory for the artifact pair
        #[arg(long, value_name = "DIR", env = "SLEEP_MODEL_DIR", default_value = sleep_quality::artifact::DEFAULT_MODEL_DIR)]
        model_dir: PathBuf,

        /// Number of trees
        #[arg(long, default_value_t = 300)]
        n_estimators: usize,

        /// Maximum tree depth (unbounded when omitted)
        #[arg(long)]
        max_depth: Option<usize>,

        /// Held-out fraction
        #[arg(long, default_value_t = 0.2)]
        test_size: f64,

        /// Random seed for the split and the forest
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Score one record given as a JSON object of field values
    Predict {
        /// Read the record from FILE instead of stdin
        #[arg(long, short, value_name = "FILE", conflicts_with = "record")]
        input: Option<PathBuf>,

        /// Record as an inline JSON string
        #[arg(long, value_name = "JSON")]
        record: Option<String>,

        /// Directory holding the artifact pair
        #[arg(long, value_name = "DIR", env = "SLEEP_MODEL_DIR", default_value = sleep_quality::artifact::DEFAULT_MODEL_DIR)]
        model_dir: PathBuf,

        /// Decision threshold in percent; Good iff probability*100 >= threshold
        #[arg(long, short, default_value_t = sleep_quality::predictor::DEFAULT_THRESHOLD_PERCENT)]
        threshold: f64,

        /// Number of feature importances to show
        #[arg(long, default_value_t = sleep_quality::predictor::DEFAULT_TOP_FEATURES)]
        top: usize,

        /// Skip sleep hygiene tips
        #[arg(long)]
        no_tips: bool,
    },

    /// Show model summary and expected input fields
    Info {
        /// Directory holding the artifact pair
        #[arg(long, value_name = "DIR", env = "SLEEP_MODEL_DIR", default_value = sleep_quality::artifact::DEFAULT_MODEL_DIR)]
        model_dir: PathBuf,
    },
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Train {
            data,
            model_dir,
            n_estimators,
            max_depth,
            test_size,
            seed,
        } => train::run(&train::TrainArgs {
            data,
            model_dir,
            n_estimators,
            max_depth,
            test_size,
            seed,
            json: cli.json,
        }),

        Commands::Predict {
            input,
            record,
            model_dir,
            threshold,
            top,
            no_tips,
        } => predict::run(&predict::PredictArgs {
            input,
            record,
            model_dir,
            threshold,
            top,
            tips: !no_tips,
            json: cli.json,
        }),

        Commands::Info { model_dir } => info::run(&model_dir, cli.json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}
