//! Train command implementation

use crate::error::{CliError, Result};
use colored::Colorize;
use serde::Serialize;
use sleep_quality::artifact::ArtifactPaths;
use sleep_quality::{TrainConfig, Trainer};
use std::path::PathBuf;

/// Arguments for `sleep-quality train`
pub(crate) struct TrainArgs {
    pub(crate) data: PathBuf,
    pub(crate) model_dir: PathBuf,
    pub(crate) n_estimators: usize,
    pub(crate) max_depth: Option<usize>,
    pub(crate) test_size: f64,
    pub(crate) seed: u64,
    pub(crate) json: bool,
}

#[derive(Serialize)]
struct TrainSummary {
    accuracy: f64,
    n_train: usize,
    n_test: usize,
    model: String,
    metadata: String,
}

/// Run the train command
pub(crate) fn run(args: &TrainArgs) -> Result<()> {
    if !args.data.is_file() {
        return Err(CliError::DatasetNotFound(args.data.clone()));
    }

    let paths = ArtifactPaths::in_dir(&args.model_dir);
    let config = TrainConfig::default()
        .with_data_path(&args.data)
        .with_artifact_paths(paths.clone())
        .with_n_estimators(args.n_estimators)
        .with_max_depth(args.max_depth)
        .with_test_size(args.test_size)
        .with_random_state(args.seed);

    let outcome = Trainer::new(config).run()?;
    let metadata = &outcome.metadata;

    if args.json {
        let summary = TrainSummary {
            accuracy: metadata.accuracy,
            n_train: metadata.n_train,
            n_test: metadata.n_test,
            model: paths.model.display().to_string(),
            metadata: paths.metadata.display().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", outcome.report);
        println!(
            "Accuracy {:.3} on {} held-out rows ({} used for training)",
            metadata.accuracy, metadata.n_test, metadata.n_train
        );
        println!("{} {}", "Saved".green(), paths.model.display());
        println!("{} {}", "Saved".green(), paths.metadata.display());
    }
    Ok(())
}
