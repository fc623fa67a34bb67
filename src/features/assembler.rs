//! Feature matrix assembly and standardization.

use std::collections::HashMap;

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::features::encoder::{country_is_gb, EncoderParams};
use crate::transform::aggregate::UserAggregates;
use crate::types::User;

/// Column-wise standardization fitted on the training matrix.
///
/// Uses population statistics per column. Zero-variance columns are
/// centered but not scaled. Transforming never refits: inference reuses
/// the persisted statistics unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    /// Fit means and standard deviations from a training matrix.
    pub fn fit(x: &Array2<f64>) -> Self {
        let cols = x.ncols();
        let rows = x.nrows();
        if rows == 0 {
            return Self {
                means: vec![0.0; cols],
                stds: vec![0.0; cols],
            };
        }

        let means: Vec<f64> = x
            .mean_axis(Axis(0))
            .map(|m| m.to_vec())
            .unwrap_or_else(|| vec![0.0; cols]);

        let stds: Vec<f64> = (0..cols)
            .map(|j| {
                let mean = means[j];
                let variance = x
                    .column(j)
                    .iter()
                    .map(|v| (v - mean).powi(2))
                    .sum::<f64>()
                    / rows as f64;
                variance.sqrt()
            })
            .collect();

        Self { means, stds }
    }

    /// Standardize a matrix with the fitted statistics.
    ///
    /// Fails fast if the matrix width drifted from what was fitted.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.means.len() {
            return Err(PipelineError::FeatureWidth {
                expected: self.means.len(),
                actual: x.ncols(),
            });
        }

        let mut out = x.clone();
        for (j, mut column) in out.columns_mut().into_iter().enumerate() {
            let mean = self.means[j];
            let std = self.stds[j];
            for value in column.iter_mut() {
                *value -= mean;
                if std > 0.0 {
                    *value /= std;
                }
            }
        }
        Ok(out)
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn stds(&self) -> &[f64] {
        &self.stds
    }
}

/// Assemble the fixed-order feature matrix, one row per user, aligned with
/// the input user ordering.
///
/// Column order: KYC one-hot, birth year, GB indicator, transaction-type
/// one-hot, terms-is-latest, id-check, capped max USD amount,
/// first-success, countries-match.
pub fn assemble(
    users: &[User],
    aggregates: &HashMap<Uuid, UserAggregates>,
    encoder: &EncoderParams,
) -> Array2<f64> {
    let width = encoder.kyc.len() + encoder.tx_type.len() + 7;
    let missing = UserAggregates::default();
    let mut flat = Vec::with_capacity(users.len() * width);

    for user in users {
        let agg = aggregates.get(&user.id).unwrap_or(&missing);

        flat.extend(encoder.encode_kyc(&user.kyc));
        flat.push(user.birth_year.unwrap_or(0) as f64);
        flat.push(country_is_gb(user));
        flat.extend(encoder.encode_tx_type(agg.top_tx_type.as_deref()));
        flat.push(encoder.terms_is_latest(user));
        flat.push(if agg.id_check { 1.0 } else { 0.0 });
        flat.push(agg.capped_max_usd);
        flat.push(if agg.first_success { 1.0 } else { 0.0 });
        flat.push(if agg.countries_match { 1.0 } else { 0.0 });
    }

    let matrix = Array2::from_shape_vec((users.len(), width), flat)
        .expect("every assembled row has the encoder width");
    info!(
        rows = matrix.nrows(),
        columns = matrix.ncols(),
        "Feature matrix assembled"
    );
    matrix
}

/// Human-readable column names matching the `assemble` order.
pub fn feature_names(encoder: &EncoderParams) -> Vec<String> {
    let mut names = Vec::new();
    for category in encoder.kyc.categories() {
        names.push(format!("KYC_{category}"));
    }
    names.push("BIRTH_YEAR".to_string());
    names.push("COUNTRY_ISGB".to_string());
    for category in encoder.tx_type.categories() {
        names.push(format!("TYPE_{category}"));
    }
    names.push("TERMS_VERSION_LATEST".to_string());
    names.push("ID_CHECK".to_string());
    names.push("AMOUNT_USD".to_string());
    names.push("FIRST_SUCCESS".to_string());
    names.push("COUNTRIES_MATCH".to_string());
    names
}

/// The 0/1 training label vector, aligned with the user ordering.
pub fn labels(users: &[User]) -> Vec<f64> {
    users
        .iter()
        .map(|u| if u.is_fraudster { 1.0 } else { 0.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::user::test_support::user;
    use ndarray::array;

    fn fitted_encoder(users: &[User]) -> EncoderParams {
        EncoderParams::fit(
            users,
            [
                Some("CARD_PAYMENT"),
                Some("TOPUP"),
                Some("ATM"),
                Some("BANK_TRANSFER"),
                Some("P2P"),
                None,
            ],
        )
    }

    fn training_users() -> Vec<User> {
        vec![
            user(Uuid::from_u128(1), Some("GB"), "PASSED"),
            user(Uuid::from_u128(2), Some("FR"), "FAILED"),
            user(Uuid::from_u128(3), Some("GB"), "NONE"),
            user(Uuid::from_u128(4), None, "PENDING"),
        ]
    }

    #[test]
    fn test_matrix_has_seventeen_columns() {
        let users = training_users();
        let encoder = fitted_encoder(&users);
        let aggregates = HashMap::new();

        let x = assemble(&users, &aggregates, &encoder);

        assert_eq!(x.nrows(), 4);
        assert_eq!(x.ncols(), 17);
        assert_eq!(feature_names(&encoder).len(), 17);
    }

    #[test]
    fn test_user_without_aggregates_gets_conservative_row() {
        let users = vec![user(Uuid::from_u128(1), Some("FR"), "PASSED")];
        let encoder = fitted_encoder(&users);

        let x = assemble(&users, &HashMap::new(), &encoder);

        // id-check, amount, first-success, countries-match are the last
        // four columns and all default to zero
        let row = x.row(0);
        let tail: Vec<f64> = row.iter().rev().take(4).copied().collect();
        assert_eq!(tail, [0.0, 0.0, 0.0, 0.0]);
        // the missing transaction type still one-hot encodes to one column
        let type_block: f64 = row
            .iter()
            .skip(encoder.kyc.len() + 2)
            .take(encoder.tx_type.len())
            .sum();
        assert_eq!(type_block, 1.0);
    }

    #[test]
    fn test_scaler_standardizes_columns() {
        let x = array![[1.0, 10.0], [3.0, 10.0]];
        let scaler = StandardScaler::fit(&x);

        assert_eq!(scaler.means(), [2.0, 10.0]);
        assert_eq!(scaler.stds(), [1.0, 0.0]);

        let scaled = scaler.transform(&x).unwrap();
        assert_eq!(scaled[[0, 0]], -1.0);
        assert_eq!(scaled[[1, 0]], 1.0);
        // zero-variance column is centered, not scaled
        assert_eq!(scaled[[0, 1]], 0.0);
        assert_eq!(scaled[[1, 1]], 0.0);
    }

    #[test]
    fn test_scaler_rejects_width_drift() {
        let scaler = StandardScaler::fit(&array![[1.0, 2.0], [3.0, 4.0]]);
        let err = scaler.transform(&array![[1.0], [2.0]]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::FeatureWidth {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_assembly_is_deterministic_for_a_fixed_artifact() {
        let users = training_users();
        let encoder = fitted_encoder(&users);
        let aggregates = HashMap::new();

        let first = assemble(&users, &aggregates, &encoder);
        let scaler = StandardScaler::fit(&first);
        let second = assemble(&users, &aggregates, &encoder);

        assert_eq!(first, second);
        assert_eq!(
            scaler.transform(&first).unwrap(),
            scaler.transform(&second).unwrap()
        );
    }
}
