//! Predict command implementation
//!
//! The record is a JSON object keyed by field name. Keys are normalized the
//! same way CSV headers are, so `"Sleep Duration"` and `"sleep_duration"`
//! address the same column. Two keys that normalize to one column are
//! rejected rather than letting one silently win.

use crate::error::{CliError, Result};
use colored::Colorize;
use serde::Serialize;
use sleep_quality::advice::{recommendations, Tip};
use sleep_quality::artifact::ArtifactPaths;
use sleep_quality::data::{normalize_column_name, FieldValue, RawRecord};
use sleep_quality::predictor::{ImportanceReport, Prediction, RankedFeature};
use sleep_quality::{Label, Predictor};
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::PathBuf;

/// Arguments for `sleep-quality predict`
pub(crate) struct PredictArgs {
    pub(crate) input: Option<PathBuf>,
    pub(crate) record: Option<String>,
    pub(crate) model_dir: PathBuf,
    pub(crate) threshold: f64,
    pub(crate) top: usize,
    pub(crate) tips: bool,
    pub(crate) json: bool,
}

#[derive(Serialize)]
struct PredictOutput {
    #[serde(flatten)]
    prediction: Prediction,
    threshold_percent: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tips: Vec<Tip>,
}

/// Run the predict command
pub(crate) fn run(args: &PredictArgs) -> Result<()> {
    if !(0.0..=100.0).contains(&args.threshold) {
        return Err(CliError::InvalidInput(format!(
            "threshold must be within [0, 100], got {}",
            args.threshold
        )));
    }

    let text = read_input(args)?;
    let record = parse_record(&text)?;

    let predictor = Predictor::load(&ArtifactPaths::in_dir(&args.model_dir))?;
    let mut prediction = predictor.predict(&record, args.threshold)?;
    if let ImportanceReport::Available(features) = &mut prediction.importances {
        features.truncate(args.top);
    }
    let tips = if args.tips {
        recommendations(&record)
    } else {
        Vec::new()
    };

    if args.json {
        let output = PredictOutput {
            prediction,
            threshold_percent: args.threshold,
            tips,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_human(&prediction, args.threshold, &tips);
    }
    Ok(())
}

fn read_input(args: &PredictArgs) -> Result<String> {
    if let Some(record) = &args.record {
        return Ok(record.clone());
    }
    if let Some(path) = &args.input {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

/// Parses a JSON object into a record with normalized keys.
fn parse_record(text: &str) -> Result<RawRecord> {
    let fields: BTreeMap<String, FieldValue> = serde_json::from_str(text)?;
    let mut seen: HashMap<String, String> = HashMap::with_capacity(fields.len());
    let mut record = RawRecord::new();
    for (name, value) in fields {
        let column = normalize_column_name(&name);
        if let Some(first) = seen.get(&column) {
            return Err(CliError::InvalidInput(format!(
                "fields '{first}' and '{name}' both map to column '{column}'"
            )));
        }
        seen.insert(column.clone(), name);
        record.insert(column, value);
    }
    Ok(record)
}

fn print_human(prediction: &Prediction, threshold: f64, tips: &[Tip]) {
    let label = match prediction.label {
        Label::Good => prediction.label.as_str().green().bold(),
        Label::Poor => prediction.label.as_str().red().bold(),
    };
    println!(
        "Predicted sleep quality: {label} ({:.1}% probability of Good, threshold {threshold}%)",
        prediction.probability * 100.0
    );
    match &prediction.importances {
        ImportanceReport::Available(features) => {
            println!("\n{}", "Top features:".bold());
            for RankedFeature { name, importance } in features {
                println!("  {name:<40} {importance:.4}");
            }
        }
        ImportanceReport::Unavailable => {
            println!("\nFeature importances are not available for this model.");
        }
    }
    if !tips.is_empty() {
        println!("\n{}", "Tips:".bold());
        for tip in tips {
            println!("  - {}", tip.message);
        }
    }
}
