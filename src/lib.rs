//! Sleep-quality classification in pure Rust.
//!
//! Predicts a binary Good/Poor sleep label from lifestyle and physiological
//! measurements. Training fits a standard scaler and one-hot encoder on the
//! training split, grows a class-balanced random forest on the encoded rows
//! and persists the pipeline together with a metadata document that fixes
//! the feature layout. Inference reloads both, checks that they agree and
//! scores one record at a time.
//!
//! # Quick Start
//!
//! ```
//! use sleep_quality::prelude::*;
//!
//! let csv = "\
//! Sleep Duration,Stress Level,Occupation,Quality of Sleep
//! 4.5,8,Nurse,4
//! 4.8,8,Nurse,5
//! 5.0,7,Nurse,5
//! 5.2,8,Sales,4
//! 5.5,9,Sales,5
//! 7.5,3,Doctor,8
//! 7.8,3,Doctor,8
//! 8.0,2,Engineer,9
//! 8.1,3,Engineer,8
//! 7.9,4,Doctor,9
//! ";
//! let dataset = Dataset::from_reader(csv.as_bytes()).expect("valid csv");
//! let config = TrainConfig::default().with_n_estimators(20).with_test_size(0.4);
//! let outcome = Trainer::new(config).fit_dataset(dataset).expect("training should succeed");
//!
//! let predictor = Predictor::from_parts(outcome.pipeline, outcome.metadata)
//!     .expect("metadata matches pipeline");
//!
//! let mut record = RawRecord::new();
//! record.insert("sleep_duration", 8.0);
//! record.insert("stress_level", 2.0);
//! record.insert("occupation", "Engineer");
//!
//! let prediction = predictor.predict(&record, 50.0).expect("fitted");
//! assert_eq!(prediction.label, Label::Good);
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Dense `Matrix` container
//! - [`data`]: CSV loading and name-keyed raw records
//! - [`schema`]: Feature column selection and label derivation
//! - [`preprocessing`]: Standard scaler, one-hot encoder, column transformer
//! - [`tree`]: CART decision trees and the random forest
//! - [`metrics`]: Accuracy and per-class classification report
//! - [`model_selection`]: Stratified train/test split
//! - [`pipeline`]: Preprocessor plus forest as one fitted unit
//! - [`artifact`]: Atomic model and metadata persistence
//! - [`trainer`]: Offline training job
//! - [`predictor`]: Validated inference and feature importances
//! - [`advice`]: Rule-based sleep hygiene tips

pub mod advice;
pub mod artifact;
pub mod data;
pub mod error;
pub mod metrics;
pub mod model_selection;
pub mod pipeline;
pub mod predictor;
pub mod prelude;
pub mod preprocessing;
pub mod primitives;
pub mod schema;
pub mod traits;
pub mod trainer;
pub mod tree;

pub use error::{Result, SleepError};
pub use predictor::{Label, Prediction, Predictor, SharedPredictor};
pub use trainer::{TrainConfig, Trainer};
