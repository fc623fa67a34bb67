//! Batch Fraud-Scoring Pipeline - Main Entry Point
//!
//! `fit` mode derives the fitted-parameters artifact and the training
//! feature matrix/labels from labeled data; `score` mode reuses the
//! artifact to score an unlabeled batch and writes per-user decisions.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::Array2;
use tracing::info;
use uuid::Uuid;

use fraud_scoring_pipeline::config::AppConfig;
use fraud_scoring_pipeline::decision::score_users;
use fraud_scoring_pipeline::features::assembler::{assemble, feature_names, labels, StandardScaler};
use fraud_scoring_pipeline::features::encoder::EncoderParams;
use fraud_scoring_pipeline::features::FittedParams;
use fraud_scoring_pipeline::ingest;
use fraud_scoring_pipeline::metrics::RunMetrics;
use fraud_scoring_pipeline::models::OnnxClassifier;
use fraud_scoring_pipeline::transform::aggregate::{aggregate_users, UserAggregates};
use fraud_scoring_pipeline::transform::reference::label_fraudsters;
use fraud_scoring_pipeline::transform::{CountryCodeMap, CurrencyNormalizer};
use fraud_scoring_pipeline::types::{Decision, Transaction, User};

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fraud_scoring_pipeline=info".parse()?),
        )
        .init();

    let mode = std::env::args().nth(1).unwrap_or_else(|| "score".to_string());
    let config = AppConfig::load()?;

    match mode.as_str() {
        "fit" => fit(&config),
        "score" => score(&config),
        other => bail!("unknown mode {other:?}; use `fit` or `score`"),
    }
}

/// The raw tables after the reference joins and currency normalization.
struct PreparedBatch {
    users: Vec<User>,
    transactions: Vec<Transaction>,
    aggregates: HashMap<Uuid, UserAggregates>,
}

/// Load and transform a batch up to the per-user aggregates.
fn prepare(config: &AppConfig, with_labels: bool) -> Result<PreparedBatch> {
    let data = &config.data;
    let mut transactions = ingest::load_transactions(Path::new(&data.transactions))?;
    let mut users = ingest::load_users(Path::new(&data.users))?;
    let countries = ingest::load_countries(Path::new(&data.countries))?;
    let fx_rates = ingest::load_fx_rates(Path::new(&data.fx_rates))?;
    let currency_details = ingest::load_currency_details(Path::new(&data.currency_details))?;

    if with_labels {
        let fraudsters_path = data
            .fraudsters
            .as_ref()
            .context("fit mode needs data.fraudsters in the configuration")?;
        let fraud_ids = ingest::load_fraudster_ids(Path::new(fraudsters_path))?;
        label_fraudsters(&mut users, &fraud_ids);
    }

    let country_map = CountryCodeMap::from_reference(&countries);
    country_map.apply(&mut transactions);

    let normalizer = CurrencyNormalizer::new(&currency_details, &fx_rates);
    let transactions = normalizer.normalize(transactions);

    let aggregates = aggregate_users(&users, &transactions);

    Ok(PreparedBatch {
        users,
        transactions,
        aggregates,
    })
}

/// Fit mode: derive and persist the fitted parameters, feature matrix, and
/// label vector from the labeled training exports.
fn fit(config: &AppConfig) -> Result<()> {
    info!("Starting fit run");
    let batch = prepare(config, true)?;

    let encoder = EncoderParams::fit(
        &batch.users,
        batch
            .users
            .iter()
            .map(|u| {
                batch
                    .aggregates
                    .get(&u.id)
                    .and_then(|a| a.top_tx_type.as_deref())
            }),
    );

    let x = assemble(&batch.users, &batch.aggregates, &encoder);
    let scaler = StandardScaler::fit(&x);
    let x_scaled = scaler.transform(&x)?;

    let params = FittedParams { encoder, scaler };
    params.save(Path::new(&config.artifacts.fitted_params))?;

    write_matrix(
        Path::new(&config.artifacts.features),
        &feature_names(&params.encoder),
        &x_scaled,
    )?;
    write_labels(Path::new(&config.artifacts.labels), &labels(&batch.users))?;

    info!(
        users = batch.users.len(),
        transactions = batch.transactions.len(),
        "Fit run complete"
    );
    Ok(())
}

/// Score mode: reuse the fitted artifact to score an unlabeled batch and
/// write per-user decisions.
fn score(config: &AppConfig) -> Result<()> {
    info!("Starting score run");
    let params = FittedParams::load(Path::new(&config.artifacts.fitted_params))?;
    let batch = prepare(config, false)?;

    let x = assemble(&batch.users, &batch.aggregates, &params.encoder);
    let x_scaled = params.scaler.transform(&x)?;

    write_matrix(
        Path::new(&config.artifacts.features),
        &feature_names(&params.encoder),
        &x_scaled,
    )?;

    let classifier = OnnxClassifier::load(&config.model.path, config.model.onnx_threads)?;
    let decisions = score_users(&batch.users, &x_scaled, &classifier)?;

    let thresholds = &config.decision.thresholds;
    let mut metrics = RunMetrics::new();
    for (user, decision) in batch.users.iter().zip(&decisions) {
        metrics.record_decision(decision, decision.action(thresholds), user.is_locked());
    }

    write_predictions(Path::new(&config.artifacts.predictions), &decisions)?;
    metrics.print_summary();
    info!(
        predictions = %config.artifacts.predictions,
        "Score run complete"
    );
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory for {path:?}"))?;
    }
    Ok(())
}

/// Persist a feature matrix snapshot with named columns.
fn write_matrix(path: &Path, names: &[String], x: &Array2<f64>) -> Result<()> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to open {path:?} for writing"))?;

    writer.write_record(names)?;
    for row in x.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = x.nrows(), "Feature matrix saved");
    Ok(())
}

/// Persist the training label vector.
fn write_labels(path: &Path, labels: &[f64]) -> Result<()> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to open {path:?} for writing"))?;

    writer.write_record(["IS_FRAUDSTER"])?;
    for label in labels {
        writer.write_record([label.to_string()])?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = labels.len(), "Labels saved");
    Ok(())
}

/// Persist the per-user decision table.
fn write_predictions(path: &Path, decisions: &[Decision]) -> Result<()> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to open {path:?} for writing"))?;

    for decision in decisions {
        writer.serialize(decision)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = decisions.len(), "Predictions saved");
    Ok(())
}
