//! Batch Fraud-Scoring Pipeline Library
//!
//! Ingests raw transaction, user, FX, and currency reference tables,
//! derives a fixed per-user feature matrix, and maps classifier output to
//! fraud decisions with a locked-account override.

pub mod config;
pub mod decision;
pub mod error;
pub mod features;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod transform;
pub mod types;

pub use config::AppConfig;
pub use decision::{score_users, DecisionTable};
pub use error::PipelineError;
pub use features::FittedParams;
pub use metrics::RunMetrics;
pub use models::{FraudClassifier, OnnxClassifier};
pub use transform::{aggregate_users, CountryCodeMap, CurrencyNormalizer};
pub use types::{Decision, Transaction, User};
