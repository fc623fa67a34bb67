//! Error types for the fraud-scoring pipeline

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

type Source = Box<dyn std::error::Error + Send + Sync>;

/// Pipeline error type
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("required input {path:?} is missing ({hint})")]
    MissingInput {
        path: PathBuf,
        hint: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed row in the {table} table, load rolled back")]
    Schema {
        table: &'static str,
        #[source]
        source: Source,
    },

    #[error("fitted-parameters artifact at {path:?} is unusable; run fit mode first")]
    Artifact {
        path: PathBuf,
        #[source]
        source: Source,
    },

    #[error("feature matrix has {actual} columns, scaler was fitted on {expected}")]
    FeatureWidth { expected: usize, actual: usize },

    #[error("user {0} is not present in the current prediction batch")]
    UnknownUser(Uuid),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
