//! Info command implementation

use crate::error::Result;
use serde::Serialize;
use sleep_quality::artifact::ArtifactPaths;
use sleep_quality::Predictor;
use std::path::Path;

#[derive(Serialize)]
struct InfoResult<'a> {
    summary: String,
    target_definition: &'a str,
    accuracy: f64,
    num_cols: &'a [String],
    cat_cols: &'a [String],
    n_features: usize,
}

/// Run the info command
pub(crate) fn run(model_dir: &Path, json: bool) -> Result<()> {
    let predictor = Predictor::load(&ArtifactPaths::in_dir(model_dir))?;
    let metadata = predictor.metadata();

    if json {
        let result = InfoResult {
            summary: predictor.about(),
            target_definition: &metadata.target_definition,
            accuracy: metadata.accuracy,
            num_cols: &metadata.num_cols,
            cat_cols: &metadata.cat_cols,
            n_features: metadata.feature_names.len(),
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", predictor.about());
    println!("Numeric fields:     {}", metadata.num_cols.join(", "));
    println!("Categorical fields: {}", metadata.cat_cols.join(", "));
    for (column, vocab) in &metadata.categories {
        println!("  {column}: {}", vocab.join(" | "));
    }
    println!("Encoded features:   {}", metadata.feature_names.len());
    Ok(())
}
