//! Interactive per-user decision lookup over a saved predictions file.

use std::fs::File;
use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use uuid::Uuid;

use fraud_scoring_pipeline::config::AppConfig;
use fraud_scoring_pipeline::decision::DecisionTable;
use fraud_scoring_pipeline::types::Decision;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = AppConfig::load()?;
    let path = Path::new(&config.artifacts.predictions);

    let file = File::open(path).with_context(|| {
        format!(
            "Predictions file {path:?} not found. Generate the predictions first by running \
             the pipeline in score mode"
        )
    })?;

    let mut reader = csv::Reader::from_reader(file);
    let decisions = reader
        .deserialize()
        .collect::<Result<Vec<Decision>, csv::Error>>()
        .with_context(|| format!("Malformed predictions file {path:?}"))?;

    let table = DecisionTable::new(decisions, config.decision.thresholds.clone());

    print!("Please enter the user ID: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let user_id: Uuid = line
        .trim()
        .parse()
        .context("The entered value is not a valid user ID")?;

    let action = table.patrol(user_id)?;
    println!("{}", action.label());

    Ok(())
}
