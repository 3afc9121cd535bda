//! Offline training job.
//!
//! Loads the labeled CSV, derives the Good/Poor label, fits the pipeline on a
//! stratified training split, evaluates on the held-out split and persists
//! the artifact pair.
//!
//! # Example
//!
//! ```no_run
//! use sleep_quality::trainer::{TrainConfig, Trainer};
//!
//! let config = TrainConfig::default()
//!     .with_data_path("data/datasleep.csv")
//!     .with_n_estimators(300);
//! let outcome = Trainer::new(config).run().expect("training should succeed");
//! println!("{}", outcome.report);
//! ```

use crate::artifact::{save_artifacts, ArtifactPaths, Metadata};
use crate::data::{Dataset, RawRecord};
use crate::error::{Result, SleepError};
use crate::metrics::ClassificationReport;
use crate::model_selection::stratified_train_test_split;
use crate::pipeline::SleepPipeline;
use crate::schema::{derive_label, FeatureSchema, TARGET_COLUMN};
use crate::tree::{ClassWeight, RandomForestClassifier};
use std::path::{Path, PathBuf};

/// Default training dataset location.
pub const DEFAULT_DATA_PATH: &str = "data/datasleep.csv";

/// Class display names indexed by label.
pub const CLASS_NAMES: [&str; 2] = ["Poor", "Good"];

/// Training job configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    data_path: PathBuf,
    artifacts: ArtifactPaths,
    n_estimators: usize,
    max_depth: Option<usize>,
    test_size: f64,
    random_state: u64,
    class_weight: ClassWeight,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            artifacts: ArtifactPaths::default(),
            n_estimators: 300,
            max_depth: None,
            test_size: 0.2,
            random_state: 42,
            class_weight: ClassWeight::Balanced,
        }
    }
}

impl TrainConfig {
    /// Sets the CSV dataset path.
    #[must_use]
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    /// Sets where artifacts are written.
    #[must_use]
    pub fn with_artifact_paths(mut self, paths: ArtifactPaths) -> Self {
        self.artifacts = paths;
        self
    }

    /// Sets the number of trees.
    #[must_use]
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Bounds tree depth (`None` = grow until pure).
    #[must_use]
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the held-out fraction.
    #[must_use]
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Sets the seed for the split and the forest.
    #[must_use]
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Sets class weighting.
    #[must_use]
    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    /// CSV dataset path.
    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Artifact destinations.
    #[must_use]
    pub fn artifacts(&self) -> &ArtifactPaths {
        &self.artifacts
    }

    fn forest(&self) -> RandomForestClassifier {
        let forest = RandomForestClassifier::new(self.n_estimators)
            .with_random_state(self.random_state)
            .with_class_weight(self.class_weight);
        match self.max_depth {
            Some(depth) => forest.with_max_depth(depth),
            None => forest,
        }
    }
}

/// Result of a training run.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    /// Fitted pipeline
    pub pipeline: SleepPipeline,
    /// Metadata persisted alongside it
    pub metadata: Metadata,
    /// Held-out evaluation
    pub report: ClassificationReport,
}

/// Runs the training job for a [`TrainConfig`].
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainConfig,
}

impl Trainer {
    /// Creates a trainer.
    #[must_use]
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// The job configuration.
    #[must_use]
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Loads the dataset, fits, evaluates and persists the artifacts.
    ///
    /// Nothing is written unless fitting and evaluation succeed.
    ///
    /// # Errors
    ///
    /// Returns [`SleepError::Schema`] if the target column is absent,
    /// [`SleepError::Data`] for empty or unsplittable data, and I/O errors
    /// from reading the CSV or writing artifacts.
    pub fn run(&self) -> Result<TrainOutcome> {
        tracing::info!(path = %self.config.data_path.display(), "loading training data");
        let dataset = Dataset::from_csv_path(&self.config.data_path)?;
        let mut outcome = self.fit_dataset(dataset)?;
        outcome.metadata = save_artifacts(&self.config.artifacts, &outcome.pipeline, &outcome.metadata)?;
        Ok(outcome)
    }

    /// Fits and evaluates on an in-memory dataset without persisting.
    ///
    /// # Errors
    ///
    /// Same as [`Trainer::run`] minus I/O.
    pub fn fit_dataset(&self, mut dataset: Dataset) -> Result<TrainOutcome> {
        if !dataset.has_column(TARGET_COLUMN) {
            return Err(SleepError::missing_column(TARGET_COLUMN, dataset.columns()));
        }

        let dropped = dataset.drop_missing(TARGET_COLUMN);
        if dropped > 0 {
            tracing::warn!(dropped, column = TARGET_COLUMN, "dropped rows with missing target");
        }
        if dataset.is_empty() {
            return Err(SleepError::Data(format!(
                "no rows with a '{TARGET_COLUMN}' value"
            )));
        }

        let labels: Vec<usize> = dataset
            .records()
            .iter()
            .map(|r| derive_label(r.number(TARGET_COLUMN)))
            .collect();
        let schema = FeatureSchema::detect(dataset.columns())?;
        tracing::info!(
            rows = dataset.len(),
            good = labels.iter().filter(|&&l| l == 1).count(),
            numeric = ?schema.numeric(),
            categorical = ?schema.categorical(),
            "prepared training data"
        );

        let (train_idx, test_idx) = stratified_train_test_split(
            &labels,
            self.config.test_size,
            self.config.random_state,
        )?;
        let (x_train, y_train) = select(dataset.records(), &labels, &train_idx);
        let (x_test, y_test) = select(dataset.records(), &labels, &test_idx);

        let mut pipeline = SleepPipeline::new(schema, self.config.forest());
        pipeline.fit(&x_train, &y_train)?;
        tracing::info!(
            n_train = y_train.len(),
            model = %pipeline.model().describe(),
            "fitted pipeline"
        );

        let y_pred = pipeline.predict(&x_test)?;
        let report = ClassificationReport::new(&y_pred, &y_test, &CLASS_NAMES)?;
        tracing::info!(
            accuracy = report.accuracy,
            n_test = y_test.len(),
            "held-out evaluation\n{}",
            report.render(3)
        );

        let metadata = Metadata::from_pipeline(
            &pipeline,
            report.accuracy,
            y_train.len(),
            y_test.len(),
        );
        Ok(TrainOutcome {
            pipeline,
            metadata,
            report,
        })
    }
}

/// Trains on `csv_path` with the default configuration, without persisting.
///
/// # Errors
///
/// See [`Trainer::fit_dataset`].
pub fn train(csv_path: impl AsRef<Path>) -> Result<(SleepPipeline, Metadata)> {
    let dataset = Dataset::from_csv_path(csv_path)?;
    let outcome = Trainer::new(TrainConfig::default()).fit_dataset(dataset)?;
    Ok((outcome.pipeline, outcome.metadata))
}

fn select(records: &[RawRecord], labels: &[usize], indices: &[usize]) -> (Vec<RawRecord>, Vec<usize>) {
    indices
        .iter()
        .map(|&i| (records[i].clone(), labels[i]))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(rows: &[(f64, f64, &str, &str)]) -> Dataset {
        let mut text = String::from("Sleep Duration,Stress Level,Gender,Quality of Sleep\n");
        for (duration, stress, gender, quality) in rows {
            text.push_str(&format!("{duration},{stress},{gender},{quality}\n"));
        }
        Dataset::from_reader(text.as_bytes()).expect("csv")
    }

    fn balanced_rows() -> Vec<(f64, f64, &'static str, &'static str)> {
        let mut rows = Vec::new();
        for i in 0..10 {
            let d = f64::from(i) * 0.1;
            rows.push((4.5 + d, 8.0, "Male", "4"));
            rows.push((7.5 + d, 3.0, "Female", "8"));
        }
        rows
    }

    fn small_config() -> TrainConfig {
        TrainConfig::default().with_n_estimators(10)
    }

    #[test]
    fn test_default_config() {
        let config = TrainConfig::default();
        assert_eq!(config.data_path(), Path::new(DEFAULT_DATA_PATH));
        assert_eq!(config.n_estimators, 300);
        assert_eq!(config.random_state, 42);
        assert!((config.test_size - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.class_weight, ClassWeight::Balanced);
        assert!(config.max_depth.is_none());
    }

    #[test]
    fn test_fit_dataset_produces_metadata() {
        let outcome = Trainer::new(small_config())
            .fit_dataset(csv(&balanced_rows()))
            .expect("fit");
        assert_eq!(outcome.metadata.num_cols, vec!["sleep_duration", "stress_level"]);
        assert_eq!(outcome.metadata.cat_cols, vec!["gender"]);
        assert_eq!(outcome.metadata.n_train + outcome.metadata.n_test, 20);
        assert_eq!(outcome.metadata.n_test, 4);
        assert!(outcome.report.accuracy > 0.99);
        assert_eq!(outcome.metadata.accuracy, outcome.report.accuracy);
    }

    #[test]
    fn test_missing_target_lists_columns() {
        let ds = Dataset::from_reader("Age,Gender\n30,Male\n".as_bytes()).expect("csv");
        let err = Trainer::new(small_config()).fit_dataset(ds).expect_err("no target");
        let SleepError::Schema { column, available } = err else {
            panic!("expected schema error");
        };
        assert_eq!(column, TARGET_COLUMN);
        assert_eq!(available, vec!["age", "gender"]);
    }

    #[test]
    fn test_all_targets_missing_is_data_error() {
        let mut rows = balanced_rows();
        for row in &mut rows {
            row.3 = "";
        }
        let err = Trainer::new(small_config())
            .fit_dataset(csv(&rows))
            .expect_err("empty after drop");
        assert!(matches!(err, SleepError::Data(_)));
    }

    #[test]
    fn test_rows_with_missing_target_are_dropped() {
        let mut rows = balanced_rows();
        rows.push((6.0, 5.0, "Male", "NA"));
        let outcome = Trainer::new(small_config())
            .fit_dataset(csv(&rows))
            .expect("fit");
        assert_eq!(outcome.metadata.n_train + outcome.metadata.n_test, 20);
    }

    #[test]
    fn test_single_class_is_data_error() {
        let rows: Vec<_> = balanced_rows()
            .into_iter()
            .map(|(d, s, g, _)| (d, s, g, "9"))
            .collect();
        assert!(matches!(
            Trainer::new(small_config()).fit_dataset(csv(&rows)),
            Err(SleepError::Data(_))
        ));
    }

    #[test]
    fn test_run_writes_artifacts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data = dir.path().join("data.csv");
        let mut text = String::from("Sleep Duration,Stress Level,Gender,Quality of Sleep\n");
        for (d, s, g, q) in balanced_rows() {
            text.push_str(&format!("{d},{s},{g},{q}\n"));
        }
        std::fs::write(&data, text).expect("write csv");

        let paths = ArtifactPaths::in_dir(dir.path().join("models"));
        let config = small_config()
            .with_data_path(&data)
            .with_artifact_paths(paths.clone());
        let outcome = Trainer::new(config).run().expect("run");
        assert!(paths.model.exists());
        assert!(paths.metadata.exists());
        let on_disk = crate::artifact::read_metadata(&paths.metadata).expect("metadata");
        assert!(outcome.metadata.model_sha256.is_some());
        assert_eq!(on_disk, outcome.metadata);
    }

    #[test]
    fn test_failed_run_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data = dir.path().join("data.csv");
        std::fs::write(&data, "Age,Gender\n30,Male\n").expect("write csv");
        let paths = ArtifactPaths::in_dir(dir.path().join("models"));
        let config = small_config()
            .with_data_path(&data)
            .with_artifact_paths(paths.clone());
        assert!(Trainer::new(config).run().is_err());
        assert!(!paths.model.exists());
        assert!(!paths.metadata.exists());
    }
}
