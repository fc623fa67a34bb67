//! Feature derivation: fixed-vocabulary encoding, matrix assembly, scaling.

pub mod assembler;
pub mod encoder;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PipelineError, Result};
use assembler::StandardScaler;
use encoder::EncoderParams;

/// Everything fitted during training that inference must reuse verbatim:
/// one-hot vocabularies, the latest observed terms version, and the
/// standardization statistics. Produced once by fit mode, persisted as
/// JSON, and treated as immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedParams {
    pub encoder: EncoderParams,
    pub scaler: StandardScaler,
}

impl FittedParams {
    /// Persist the artifact as JSON, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let write = || -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_string_pretty(self)?;
            fs::write(path, json)?;
            Ok(())
        };

        write().map_err(|source| PipelineError::Artifact {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "Fitted parameters saved");
        Ok(())
    }

    /// Load a previously fitted artifact.
    pub fn load(path: &Path) -> Result<Self> {
        let read = || -> std::result::Result<Self, Box<dyn std::error::Error + Send + Sync>> {
            let json = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&json)?)
        };

        let params = read().map_err(|source| PipelineError::Artifact {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "Fitted parameters loaded");
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::user::test_support::user;
    use ndarray::array;
    use uuid::Uuid;

    #[test]
    fn test_artifact_round_trip() {
        let users = vec![user(Uuid::from_u128(1), Some("GB"), "PASSED")];
        let encoder = EncoderParams::fit(&users, std::iter::once(Some("TOPUP")));
        let scaler = StandardScaler::fit(&array![[1.0, 2.0], [3.0, 4.0]]);
        let params = FittedParams { encoder, scaler };

        let path = std::env::temp_dir().join(format!(
            "fraud-scoring-params-{}.json",
            std::process::id()
        ));
        params.save(&path).unwrap();
        let loaded = FittedParams::load(&path).unwrap();

        assert_eq!(
            loaded.encoder.latest_terms_version,
            params.encoder.latest_terms_version
        );
        assert_eq!(loaded.scaler.means(), params.scaler.means());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_artifact_is_a_typed_error() {
        let err = FittedParams::load(Path::new("/no/such/params.json")).unwrap_err();
        assert!(matches!(err, PipelineError::Artifact { .. }));
        assert!(err.to_string().contains("run fit mode first"));
    }
}
