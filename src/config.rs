//! Configuration management for the fraud-scoring pipeline

use crate::types::decision::DecisionThresholds;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub data: DataConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub decision: DecisionConfig,
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Input table locations
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Transactions CSV
    pub transactions: String,
    /// Users CSV
    pub users: String,
    /// Countries reference CSV (code, code3)
    pub countries: String,
    /// Wide-form FX rates CSV
    pub fx_rates: String,
    /// Currency details CSV
    pub currency_details: String,
    /// Fraudster user-id list, only read in fit mode
    #[serde(default)]
    pub fraudsters: Option<String>,
}

/// Classifier artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the trained ONNX model
    pub path: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

/// Decision configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DecisionConfig {
    /// Confidence thresholds for the three-way action mapping
    #[serde(default)]
    pub thresholds: DecisionThresholds,
}

/// Where run outputs and fitted parameters are persisted
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Fitted-parameters JSON (vocabularies, terms version, scaler state)
    pub fitted_params: String,
    /// Feature matrix snapshot CSV
    pub features: String,
    /// Training label vector CSV, only written in fit mode
    pub labels: String,
    /// Per-user decisions CSV, only written in score mode
    pub predictions: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                transactions: "data/transactions.csv".to_string(),
                users: "data/users.csv".to_string(),
                countries: "data/countries.csv".to_string(),
                fx_rates: "data/fx_rates.csv".to_string(),
                currency_details: "data/currency_details.csv".to_string(),
                fraudsters: Some("data/fraudsters.csv".to_string()),
            },
            model: ModelConfig {
                path: "models/fraud_clf.onnx".to_string(),
                onnx_threads: 1,
            },
            decision: DecisionConfig::default(),
            artifacts: ArtifactsConfig {
                fitted_params: "artifacts/fitted_params.json".to_string(),
                features: "artifacts/features.csv".to_string(),
                labels: "artifacts/labels.csv".to_string(),
                predictions: "artifacts/predictions.csv".to_string(),
            },
            logging: LoggingConfig::default(),
        }
    }
}
