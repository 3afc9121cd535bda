//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use sleep_quality::prelude::*;
//! ```

pub use crate::advice::{recommendations, Tip, TipKind};
pub use crate::artifact::{ArtifactPaths, Metadata};
pub use crate::data::{Dataset, FieldValue, RawRecord};
pub use crate::error::{Result, SleepError};
pub use crate::pipeline::SleepPipeline;
pub use crate::predictor::{
    ImportanceReport, Label, Prediction, Predictor, RankedFeature, SharedPredictor,
    DEFAULT_THRESHOLD_PERCENT,
};
pub use crate::preprocessing::{ColumnTransformer, OneHotEncoder, StandardScaler};
pub use crate::primitives::Matrix;
pub use crate::schema::FeatureSchema;
pub use crate::traits::{Classifier, SupportsFeatureImportance, Transformer};
pub use crate::trainer::{TrainConfig, Trainer};
pub use crate::tree::{ClassWeight, DecisionTreeClassifier, RandomForestClassifier};
