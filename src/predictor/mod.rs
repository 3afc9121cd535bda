//! Inference over persisted artifacts.
//!
//! A [`Predictor`] is built once from the artifact pair and validated
//! against itself: the metadata's declared layout must match what the
//! pipeline consumes, otherwise loading fails instead of silently
//! misaligning features. After that it is read-only and safe to share.

use crate::artifact::{load_artifacts, ArtifactPaths, Metadata};
use crate::data::RawRecord;
use crate::error::{Result, SleepError};
use crate::pipeline::SleepPipeline;
use crate::schema::GOOD_CLASS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Decision threshold used when the caller does not pick one.
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 50.0;

/// Number of features reported with each prediction.
pub const DEFAULT_TOP_FEATURES: usize = 10;

/// Thresholded sleep-quality label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Probability of good sleep at or above the threshold
    Good,
    /// Probability of good sleep below the threshold
    Poor,
}

impl Label {
    /// Applies `threshold_percent` to a probability in `[0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sleep_quality::predictor::Label;
    ///
    /// assert_eq!(Label::from_probability(0.5, 50.0), Label::Good);
    /// assert_eq!(Label::from_probability(0.49, 50.0), Label::Poor);
    /// ```
    #[must_use]
    pub fn from_probability(probability: f64, threshold_percent: f64) -> Self {
        if probability * 100.0 >= threshold_percent {
            Label::Good
        } else {
            Label::Poor
        }
    }

    /// Display name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Good => "Good",
            Label::Poor => "Poor",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the global importance ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFeature {
    /// Post-encoding feature name, e.g. `occupation_Nurse`
    pub name: String,
    /// Normalized impurity-based importance
    pub importance: f32,
}

/// Best-effort model introspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "features", rename_all = "snake_case")]
pub enum ImportanceReport {
    /// Features ranked by descending importance
    Available(Vec<RankedFeature>),
    /// The model does not expose importances
    Unavailable,
}

impl ImportanceReport {
    /// Returns true if a ranking is present.
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, ImportanceReport::Available(_))
    }
}

/// Result of one inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Thresholded label
    pub label: Label,
    /// Probability of the "Good" class, in `[0, 1]`
    pub probability: f64,
    /// Top global feature importances
    pub importances: ImportanceReport,
}

/// Loaded, validated, read-only inference handle.
#[derive(Debug, Clone)]
pub struct Predictor {
    pipeline: SleepPipeline,
    metadata: Metadata,
    ranking: Option<Vec<RankedFeature>>,
}

impl Predictor {
    /// Loads and validates the artifact pair.
    ///
    /// # Errors
    ///
    /// Returns [`SleepError::Artifact`] if either file is missing or corrupt
    /// and [`SleepError::SchemaMismatch`] if they disagree.
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let (pipeline, metadata) = load_artifacts(paths)?;
        let predictor = Self::from_parts(pipeline, metadata)?;
        tracing::info!(
            model = %paths.model.display(),
            accuracy = predictor.metadata.accuracy,
            "predictor ready"
        );
        Ok(predictor)
    }

    /// Validates an in-memory pipeline against its metadata.
    ///
    /// Metadata written without `categories` or `feature_names` gets them
    /// filled in from the pipeline; when present they must match exactly.
    ///
    /// # Errors
    ///
    /// Returns [`SleepError::SchemaMismatch`] on any layout disagreement and
    /// [`SleepError::NotFitted`] for an unfitted pipeline.
    pub fn from_parts(pipeline: SleepPipeline, mut metadata: Metadata) -> Result<Self> {
        let preprocessor = pipeline.preprocessor();
        if !preprocessor.is_fitted() || !pipeline.forest().is_fitted() {
            return Err(SleepError::NotFitted("SleepPipeline"));
        }

        let schema = preprocessor.schema();
        if metadata.num_cols != schema.numeric() {
            return Err(SleepError::schema_mismatch(
                "num_cols",
                &metadata.num_cols,
                schema.numeric(),
            ));
        }
        if metadata.cat_cols != schema.categorical() {
            return Err(SleepError::schema_mismatch(
                "cat_cols",
                &metadata.cat_cols,
                schema.categorical(),
            ));
        }

        let encoder = preprocessor.encoder();
        if metadata.categories.is_empty() && !encoder.columns().is_empty() {
            metadata.categories = encoder
                .columns()
                .iter()
                .cloned()
                .zip(encoder.categories().iter().cloned())
                .collect();
        }
        if metadata.categories.len() != encoder.columns().len() {
            return Err(SleepError::schema_mismatch(
                "categories",
                metadata.categories.keys().collect::<Vec<_>>(),
                encoder.columns(),
            ));
        }
        for (col, vocab) in encoder.columns().iter().zip(encoder.categories()) {
            if metadata.categories.get(col) != Some(vocab) {
                return Err(SleepError::schema_mismatch(
                    &format!("categories.{col}"),
                    metadata.categories.get(col),
                    vocab,
                ));
            }
        }

        let feature_names = preprocessor.feature_names();
        if metadata.feature_names.is_empty() {
            metadata.feature_names.clone_from(&feature_names);
        }
        if metadata.feature_names != feature_names {
            return Err(SleepError::schema_mismatch(
                "feature_names",
                &metadata.feature_names,
                &feature_names,
            ));
        }

        let model = pipeline.model();
        if model.n_features() != preprocessor.n_output_features() {
            return Err(SleepError::schema_mismatch(
                "n_features",
                preprocessor.n_output_features(),
                model.n_features(),
            ));
        }
        if metadata.positive_class != GOOD_CLASS {
            return Err(SleepError::schema_mismatch(
                "positive_class",
                metadata.positive_class,
                GOOD_CLASS,
            ));
        }
        if metadata.positive_class >= model.n_classes() {
            return Err(SleepError::schema_mismatch(
                "positive_class",
                metadata.positive_class,
                model.n_classes(),
            ));
        }

        let ranking = rank_features(&pipeline, &metadata.feature_names);
        if ranking.is_none() {
            tracing::debug!("model does not expose feature importances");
        }
        Ok(Self {
            pipeline,
            metadata,
            ranking,
        })
    }

    /// Probability of good sleep for `record`, in `[0, 1]`.
    ///
    /// Fields are looked up by name; absent fields become missing values and
    /// unseen categories encode as all-zero groups.
    ///
    /// # Errors
    ///
    /// Only fails if the pipeline is not fitted, which [`Predictor::load`]
    /// already rules out.
    pub fn probability(&self, record: &RawRecord) -> Result<f64> {
        let proba = self.pipeline.predict_proba_one(record)?;
        let p = proba
            .get(self.metadata.positive_class)
            .copied()
            .unwrap_or(0.0);
        Ok(f64::from(p).clamp(0.0, 1.0))
    }

    /// Scores `record` and applies `threshold_percent`.
    ///
    /// # Errors
    ///
    /// See [`Predictor::probability`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sleep_quality::artifact::ArtifactPaths;
    /// use sleep_quality::data::{FieldValue, RawRecord};
    /// use sleep_quality::predictor::{Predictor, DEFAULT_THRESHOLD_PERCENT};
    ///
    /// let predictor = Predictor::load(&ArtifactPaths::default()).expect("artifacts present");
    /// let mut record = RawRecord::new();
    /// record.insert("sleep_duration", 7.5);
    /// record.insert("stress_level", 3.0);
    /// record.insert("occupation", "Nurse");
    /// record.insert("sleep_disorder", FieldValue::Null);
    ///
    /// let prediction = predictor
    ///     .predict(&record, DEFAULT_THRESHOLD_PERCENT)
    ///     .expect("fitted pipeline");
    /// println!("{} ({:.1}%)", prediction.label, prediction.probability * 100.0);
    /// ```
    pub fn predict(&self, record: &RawRecord, threshold_percent: f64) -> Result<Prediction> {
        let probability = self.probability(record)?;
        Ok(Prediction {
            label: Label::from_probability(probability, threshold_percent),
            probability,
            importances: self.top_features(DEFAULT_TOP_FEATURES),
        })
    }

    /// The `n` globally most important features.
    #[must_use]
    pub fn top_features(&self, n: usize) -> ImportanceReport {
        match &self.ranking {
            Some(ranked) => ImportanceReport::Available(ranked.iter().take(n).cloned().collect()),
            None => ImportanceReport::Unavailable,
        }
    }

    /// Raw input columns in pipeline order.
    #[must_use]
    pub fn expected_columns(&self) -> Vec<String> {
        self.pipeline.expected_columns()
    }

    /// The validated metadata.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The loaded pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &SleepPipeline {
        &self.pipeline
    }

    /// One-line model summary for operators.
    #[must_use]
    pub fn about(&self) -> String {
        format!(
            "{} | held-out accuracy {:.3} | target: {}",
            self.pipeline.model().describe(),
            self.metadata.accuracy,
            self.metadata.target_definition
        )
    }
}

/// Pairs importances with names, most important first; ties keep feature
/// order.
fn rank_features(pipeline: &SleepPipeline, names: &[String]) -> Option<Vec<RankedFeature>> {
    let importances = pipeline.model().feature_importance()?.feature_importances()?;
    if importances.len() != names.len() {
        tracing::warn!(
            importances = importances.len(),
            names = names.len(),
            "importance vector does not match feature names"
        );
        return None;
    }
    let mut ranked: Vec<RankedFeature> = names
        .iter()
        .zip(importances)
        .map(|(name, importance)| RankedFeature {
            name: name.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    Some(ranked)
}

/// Process-wide predictor with explicit lifecycle.
///
/// The first [`SharedPredictor::get`] loads the artifacts; later calls
/// return the same `Arc`. [`SharedPredictor::reload`] loads a fresh pair
/// and swaps it in, so in-flight readers keep the old instance until they
/// drop it.
#[derive(Debug)]
pub struct SharedPredictor {
    paths: ArtifactPaths,
    slot: RwLock<Option<Arc<Predictor>>>,
}

impl SharedPredictor {
    /// Creates an empty handle; nothing is read until first use.
    #[must_use]
    pub fn new(paths: ArtifactPaths) -> Self {
        Self {
            paths,
            slot: RwLock::new(None),
        }
    }

    /// Artifact locations this handle loads from.
    #[must_use]
    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Returns true once a predictor has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Returns the loaded predictor, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns the load error if the artifacts are missing or invalid; the
    /// next call retries.
    pub fn get(&self) -> Result<Arc<Predictor>> {
        if let Some(p) = self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(p));
        }

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(p) = slot.as_ref() {
            return Ok(Arc::clone(p));
        }
        let loaded = Arc::new(Predictor::load(&self.paths)?);
        *slot = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Loads the current artifact pair and replaces the cached predictor.
    ///
    /// On failure the previous predictor stays in place.
    ///
    /// # Errors
    ///
    /// Returns the load error.
    pub fn reload(&self) -> Result<Arc<Predictor>> {
        let loaded = Arc::new(Predictor::load(&self.paths)?);
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&loaded));
        tracing::info!(model = %self.paths.model.display(), "predictor reloaded");
        Ok(loaded)
    }
}
