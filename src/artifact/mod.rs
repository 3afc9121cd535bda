//! Persisted model and metadata artifacts.
//!
//! Training writes two files: the bincode-encoded [`SleepPipeline`] and a
//! JSON [`Metadata`] document that declares the feature layout. Each file is
//! written to a temporary sibling, synced and renamed into place, so a
//! crash never leaves a half-written artifact over a good one. The metadata
//! records the SHA-256 of the model body it was written with; loading a pair
//! whose digests disagree fails instead of mixing two training runs.

use crate::error::{Result, SleepError};
use crate::pipeline::SleepPipeline;
use crate::schema::{GOOD_CLASS, TARGET_DEFINITION};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Magic bytes at the start of the model file.
pub const MODEL_MAGIC: &[u8; 4] = b"SLPQ";

/// Version of both the model header and the metadata layout.
pub const FORMAT_VERSION: u32 = 1;

/// Default artifact directory.
pub const DEFAULT_MODEL_DIR: &str = "models";

/// Model file name inside the artifact directory.
pub const MODEL_FILE_NAME: &str = "model.bin";

/// Metadata file name inside the artifact directory.
pub const METADATA_FILE_NAME: &str = "meta.json";

const HEADER_LEN: usize = 8;

/// Training-time description of the persisted model.
///
/// `num_cols` and `cat_cols` are the ordering-of-truth for inference;
/// `categories` and `feature_names` make importance reporting independent of
/// the live encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Label derivation rule
    pub target_definition: String,
    /// Numeric input columns, in pipeline order
    pub num_cols: Vec<String>,
    /// Categorical input columns, in pipeline order
    pub cat_cols: Vec<String>,
    /// Held-out accuracy
    pub accuracy: f64,
    /// One-hot vocabulary per categorical column
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
    /// Post-encoding feature names, aligned with model input indices
    #[serde(default)]
    pub feature_names: Vec<String>,
    /// Probability column holding the "Good" class
    #[serde(default = "default_positive_class")]
    pub positive_class: usize,
    /// Training split size
    #[serde(default)]
    pub n_train: usize,
    /// Held-out split size
    #[serde(default)]
    pub n_test: usize,
    /// Layout version
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    /// Hex SHA-256 of the encoded model body, stamped by [`save_artifacts`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_sha256: Option<String>,
}

fn default_positive_class() -> usize {
    GOOD_CLASS
}

fn default_format_version() -> u32 {
    FORMAT_VERSION
}

impl Metadata {
    /// Describes a fitted pipeline.
    #[must_use]
    pub fn from_pipeline(
        pipeline: &SleepPipeline,
        accuracy: f64,
        n_train: usize,
        n_test: usize,
    ) -> Self {
        let preprocessor = pipeline.preprocessor();
        let encoder = preprocessor.encoder();
        let categories = encoder
            .columns()
            .iter()
            .cloned()
            .zip(encoder.categories().iter().cloned())
            .collect();

        Self {
            target_definition: TARGET_DEFINITION.to_string(),
            num_cols: preprocessor.schema().numeric().to_vec(),
            cat_cols: preprocessor.schema().categorical().to_vec(),
            accuracy,
            categories,
            feature_names: preprocessor.feature_names(),
            positive_class: GOOD_CLASS,
            n_train,
            n_test,
            format_version: FORMAT_VERSION,
            model_sha256: None,
        }
    }
}

/// Locations of the two artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Serialized pipeline
    pub model: PathBuf,
    /// Metadata document
    pub metadata: PathBuf,
}

impl ArtifactPaths {
    /// Explicit paths.
    #[must_use]
    pub fn new(model: impl Into<PathBuf>, metadata: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            metadata: metadata.into(),
        }
    }

    /// `model.bin` and `meta.json` inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(MODEL_FILE_NAME), dir.join(METADATA_FILE_NAME))
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::in_dir(DEFAULT_MODEL_DIR)
    }
}

/// Writes the pipeline and its metadata, returning the metadata as written.
///
/// The returned copy carries `model_sha256` for the model body. A crash
/// between the two renames leaves a pair whose digests disagree, which
/// [`load_artifacts`] rejects.
///
/// # Errors
///
/// Returns an error if a directory cannot be created or a file cannot be
/// written, synced or renamed.
pub fn save_artifacts(
    paths: &ArtifactPaths,
    pipeline: &SleepPipeline,
    metadata: &Metadata,
) -> Result<Metadata> {
    let mut model_bytes = Vec::with_capacity(HEADER_LEN);
    model_bytes.extend_from_slice(MODEL_MAGIC);
    model_bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bincode::serialize_into(&mut model_bytes, pipeline)?;

    let mut written = metadata.clone();
    written.model_sha256 = Some(body_digest(&model_bytes[HEADER_LEN..]));
    let metadata_bytes = serde_json::to_vec_pretty(&written)?;

    write_atomic(&paths.model, &model_bytes)?;
    tracing::info!(path = %paths.model.display(), bytes = model_bytes.len(), "wrote model artifact");
    write_atomic(&paths.metadata, &metadata_bytes)?;
    tracing::info!(path = %paths.metadata.display(), "wrote metadata artifact");
    Ok(written)
}

/// Reads the pipeline and metadata.
///
/// # Errors
///
/// Returns [`SleepError::Artifact`] if either file is missing, truncated,
/// carries the wrong header or fails to decode, or if the metadata records a
/// model checksum that differs from the model file.
pub fn load_artifacts(paths: &ArtifactPaths) -> Result<(SleepPipeline, Metadata)> {
    let (pipeline, digest) = read_model(&paths.model)?;
    let metadata = read_metadata(&paths.metadata)?;
    // Documents written before the checksum existed carry none.
    if let Some(expected) = &metadata.model_sha256 {
        if *expected != digest {
            return Err(SleepError::artifact(
                &paths.model,
                format!("model checksum {digest} does not match metadata ({expected})"),
            ));
        }
    }
    tracing::debug!(
        model = %paths.model.display(),
        metadata = %paths.metadata.display(),
        "loaded artifacts"
    );
    Ok((pipeline, metadata))
}

/// Reads only the metadata document.
///
/// # Errors
///
/// Returns [`SleepError::Artifact`] if the file is missing or malformed.
pub fn read_metadata(path: &Path) -> Result<Metadata> {
    let bytes = fs::read(path).map_err(|e| SleepError::artifact(path, format!("cannot read: {e}")))?;
    let metadata: Metadata = serde_json::from_slice(&bytes)
        .map_err(|e| SleepError::artifact(path, format!("invalid metadata: {e}")))?;
    if metadata.format_version != FORMAT_VERSION {
        return Err(SleepError::artifact(
            path,
            format!(
                "unsupported metadata version {} (expected {FORMAT_VERSION})",
                metadata.format_version
            ),
        ));
    }
    Ok(metadata)
}

fn read_model(path: &Path) -> Result<(SleepPipeline, String)> {
    let bytes = fs::read(path).map_err(|e| SleepError::artifact(path, format!("cannot read: {e}")))?;
    if bytes.len() < HEADER_LEN {
        return Err(SleepError::artifact(path, "file too short for header"));
    }
    let (header, body) = bytes.split_at(HEADER_LEN);
    if &header[..4] != MODEL_MAGIC {
        return Err(SleepError::artifact(path, "not a sleep-quality model file"));
    }
    let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if version != FORMAT_VERSION {
        return Err(SleepError::artifact(
            path,
            format!("unsupported model version {version} (expected {FORMAT_VERSION})"),
        ));
    }
    let pipeline = bincode::deserialize(body)
        .map_err(|e| SleepError::artifact(path, format!("corrupt model: {e}")))?;
    Ok((pipeline, body_digest(body)))
}

fn body_digest(body: &[u8]) -> String {
    format!("{:x}", Sha256::digest(body))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| SleepError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FieldValue, RawRecord};
    use crate::schema::FeatureSchema;
    use crate::tree::RandomForestClassifier;

    fn fitted_pipeline() -> SleepPipeline {
        fitted_pipeline_with(5)
    }

    fn fitted_pipeline_with(n_estimators: usize) -> SleepPipeline {
        let schema = FeatureSchema::new(
            vec!["sleep_duration".to_string()],
            vec!["gender".to_string()],
        )
        .expect("schema");
        let records: Vec<RawRecord> = (0..8)
            .map(|i| {
                [
                    ("sleep_duration", FieldValue::from(5.0 + f64::from(i) * 0.5)),
                    ("gender", FieldValue::from(if i % 2 == 0 { "Male" } else { "Female" })),
                ]
                .into_iter()
                .collect()
            })
            .collect();
        let labels = vec![0, 0, 0, 0, 1, 1, 1, 1];
        let mut pipeline =
            SleepPipeline::new(schema, RandomForestClassifier::new(n_estimators).with_random_state(42));
        pipeline.fit(&records, &labels).expect("fit");
        pipeline
    }

    #[test]
    fn test_metadata_describes_layout() {
        let pipeline = fitted_pipeline();
        let meta = Metadata::from_pipeline(&pipeline, 0.9, 8, 2);
        assert_eq!(meta.num_cols, vec!["sleep_duration"]);
        assert_eq!(meta.cat_cols, vec!["gender"]);
        assert_eq!(meta.categories["gender"], vec!["Female", "Male"]);
        assert_eq!(
            meta.feature_names,
            vec!["sleep_duration", "gender_Female", "gender_Male"]
        );
        assert_eq!(meta.positive_class, GOOD_CLASS);
        assert_eq!(meta.target_definition, TARGET_DEFINITION);
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = ArtifactPaths::in_dir(dir.path().join("models"));
        let pipeline = fitted_pipeline();
        let meta = Metadata::from_pipeline(&pipeline, 0.75, 8, 2);

        let written = save_artifacts(&paths, &pipeline, &meta).expect("save");
        let (loaded, loaded_meta) = load_artifacts(&paths).expect("load");
        assert_eq!(loaded, pipeline);
        assert_eq!(loaded_meta, written);
        assert_eq!(
            Metadata {
                model_sha256: None,
                ..written
            },
            meta
        );
    }

    #[test]
    fn test_checksum_is_hex_sha256_of_model_body() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = ArtifactPaths::in_dir(dir.path());
        let pipeline = fitted_pipeline();
        let meta = Metadata::from_pipeline(&pipeline, 0.5, 8, 2);
        let written = save_artifacts(&paths, &pipeline, &meta).expect("save");
        let bytes = fs::read(&paths.model).expect("read");
        let digest = written.model_sha256.expect("checksum stamped");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, body_digest(&bytes[HEADER_LEN..]));
    }

    #[test]
    fn test_model_from_another_run_is_rejected() {
        // Simulates a crash after the model rename but before the metadata one.
        let dir = tempfile::tempdir().expect("tempdir");
        let old = ArtifactPaths::in_dir(dir.path().join("old"));
        let new = ArtifactPaths::in_dir(dir.path().join("new"));
        let pipeline = fitted_pipeline();
        save_artifacts(&old, &pipeline, &Metadata::from_pipeline(&pipeline, 0.5, 8, 2))
            .expect("save old");

        let retrained = fitted_pipeline_with(7);
        save_artifacts(&new, &retrained, &Metadata::from_pipeline(&retrained, 0.5, 8, 2))
            .expect("save new");

        fs::copy(&new.model, &old.model).expect("swap model");
        let err = load_artifacts(&old).expect_err("mixed pair");
        assert!(matches!(err, SleepError::Artifact { .. }));
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_metadata_without_checksum_still_loads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = ArtifactPaths::in_dir(dir.path());
        let pipeline = fitted_pipeline();
        let meta = Metadata::from_pipeline(&pipeline, 0.5, 8, 2);
        save_artifacts(&paths, &pipeline, &meta).expect("save");
        fs::write(&paths.metadata, serde_json::to_vec_pretty(&meta).expect("encode"))
            .expect("rewrite without checksum");
        let (_, loaded_meta) = load_artifacts(&paths).expect("load");
        assert!(loaded_meta.model_sha256.is_none());
    }

    #[test]
    fn test_metadata_is_pretty_json_with_layout_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = ArtifactPaths::in_dir(dir.path());
        let pipeline = fitted_pipeline();
        save_artifacts(&paths, &pipeline, &Metadata::from_pipeline(&pipeline, 0.5, 8, 2))
            .expect("save");
        let text = fs::read_to_string(&paths.metadata).expect("read");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        for key in ["target_definition", "num_cols", "cat_cols", "accuracy"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert!(text.contains('\n'));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = ArtifactPaths::in_dir(dir.path());
        let pipeline = fitted_pipeline();
        let meta = Metadata::from_pipeline(&pipeline, 0.5, 8, 2);
        save_artifacts(&paths, &pipeline, &meta).expect("first save");
        save_artifacts(&paths, &pipeline, &meta).expect("overwrite");
        let mut names: Vec<String> = fs::read_dir(dir.path())
            .expect("read_dir")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec![METADATA_FILE_NAME, MODEL_FILE_NAME]);
    }

    #[test]
    fn test_missing_model_is_artifact_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = ArtifactPaths::in_dir(dir.path());
        assert!(matches!(
            load_artifacts(&paths),
            Err(SleepError::Artifact { .. })
        ));
    }

    #[test]
    fn test_bad_magic_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = ArtifactPaths::in_dir(dir.path());
        fs::write(&paths.model, b"NOPE\x01\x00\x00\x00rest").expect("write");
        let err = load_artifacts(&paths).expect_err("bad magic");
        assert!(err.to_string().contains("not a sleep-quality model"));
    }

    #[test]
    fn test_truncated_model_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = ArtifactPaths::in_dir(dir.path());
        let pipeline = fitted_pipeline();
        save_artifacts(&paths, &pipeline, &Metadata::from_pipeline(&pipeline, 0.5, 8, 2))
            .expect("save");
        let bytes = fs::read(&paths.model).expect("read");
        fs::write(&paths.model, &bytes[..bytes.len() / 2]).expect("truncate");
        assert!(matches!(
            load_artifacts(&paths),
            Err(SleepError::Artifact { .. })
        ));
    }

    #[test]
    fn test_corrupt_metadata_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = ArtifactPaths::in_dir(dir.path());
        let pipeline = fitted_pipeline();
        save_artifacts(&paths, &pipeline, &Metadata::from_pipeline(&pipeline, 0.5, 8, 2))
            .expect("save");
        fs::write(&paths.metadata, "{ not json").expect("write");
        let err = load_artifacts(&paths).expect_err("corrupt metadata");
        assert!(err.to_string().contains("invalid metadata"));
    }

    #[test]
    fn test_minimal_metadata_document_parses() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(METADATA_FILE_NAME);
        fs::write(
            &path,
            r#"{"target_definition":"x","num_cols":["age"],"cat_cols":[],"accuracy":0.8}"#,
        )
        .expect("write");
        let meta = read_metadata(&path).expect("parse");
        assert_eq!(meta.positive_class, GOOD_CLASS);
        assert!(meta.feature_names.is_empty());
    }

    #[test]
    fn test_default_paths() {
        let paths = ArtifactPaths::default();
        assert_eq!(paths.model, Path::new("models").join("model.bin"));
        assert_eq!(paths.metadata, Path::new("models").join("meta.json"));
    }
}
