//! Categorical and indicator encoding with training-fixed vocabularies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::User;

/// Category used when a user has no most-frequent transaction type at all.
pub const MISSING_CATEGORY: &str = "MISSING";

/// A fixed, ordered one-hot vocabulary.
///
/// The category list is derived once (sorted, deduplicated) and the column
/// order never changes afterwards, so an encoded row always has the same
/// width no matter what a later batch contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotVocabulary {
    categories: Vec<String>,
}

impl OneHotVocabulary {
    /// Derive the vocabulary from observed values.
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut categories: Vec<String> = values.into_iter().map(str::to_string).collect();
        categories.sort();
        categories.dedup();
        Self { categories }
    }

    /// Number of columns this vocabulary emits.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// One-hot encode a value into `self.len()` columns.
    ///
    /// A value the vocabulary has never seen encodes as all zeros rather
    /// than shifting column alignment.
    pub fn encode(&self, value: &str) -> Vec<f64> {
        let mut row = vec![0.0; self.categories.len()];
        match self.categories.iter().position(|c| c == value) {
            Some(index) => row[index] = 1.0,
            None => {
                warn!(value, "Category unseen at fit time, encoding as zeros");
            }
        }
        row
    }
}

/// Encoding parameters fitted on the training batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderParams {
    /// KYC status vocabulary (4 categories in the production data)
    pub kyc: OneHotVocabulary,
    /// Most-frequent transaction type vocabulary, with the missing
    /// category always present (6 categories in the production data)
    pub tx_type: OneHotVocabulary,
    /// The newest terms version observed at fit time; frozen so inference
    /// batches never shift the indicator
    pub latest_terms_version: NaiveDate,
}

impl EncoderParams {
    /// Fit vocabularies and the latest terms version from training data.
    ///
    /// `top_tx_types` is the per-user most-frequent-type aggregate in user
    /// order; a user with no transactions contributes the missing category.
    pub fn fit<'a, I>(users: &[User], top_tx_types: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let kyc = OneHotVocabulary::fit(users.iter().map(|u| u.kyc.as_str()));

        let tx_type = OneHotVocabulary::fit(
            top_tx_types
                .into_iter()
                .map(|t| t.unwrap_or(MISSING_CATEGORY))
                .chain(std::iter::once(MISSING_CATEGORY)),
        );

        let latest_terms_version = users
            .iter()
            .map(|u| u.terms_version)
            .max()
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(1900, 1, 1).expect("valid date"));

        Self {
            kyc,
            tx_type,
            latest_terms_version,
        }
    }

    /// One-hot columns for a user's KYC status.
    pub fn encode_kyc(&self, kyc: &str) -> Vec<f64> {
        self.kyc.encode(kyc)
    }

    /// One-hot columns for a user's most-frequent transaction type.
    pub fn encode_tx_type(&self, top_tx_type: Option<&str>) -> Vec<f64> {
        self.tx_type.encode(top_tx_type.unwrap_or(MISSING_CATEGORY))
    }

    /// 0/1 indicator: is the user on the terms version that was newest at
    /// fit time.
    pub fn terms_is_latest(&self, user: &User) -> f64 {
        if user.terms_version == self.latest_terms_version {
            1.0
        } else {
            0.0
        }
    }
}

/// 0/1 indicator: is the user registered in Great Britain.
pub fn country_is_gb(user: &User) -> f64 {
    if user.country.as_deref() == Some("GB") {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::user::test_support::user;
    use uuid::Uuid;

    fn training_users() -> Vec<User> {
        let mut users = vec![
            user(Uuid::from_u128(1), Some("GB"), "PASSED"),
            user(Uuid::from_u128(2), Some("FR"), "FAILED"),
            user(Uuid::from_u128(3), Some("GB"), "NONE"),
            user(Uuid::from_u128(4), None, "PENDING"),
        ];
        users[1].terms_version = NaiveDate::from_ymd_opt(2017, 1, 10).unwrap();
        users
    }

    #[test]
    fn test_vocabulary_is_sorted_and_deduplicated() {
        let vocab = OneHotVocabulary::fit(["PASSED", "FAILED", "PASSED", "NONE"]);
        assert_eq!(vocab.categories(), ["FAILED", "NONE", "PASSED"]);
    }

    #[test]
    fn test_kyc_encoding_has_fixed_width() {
        let params = EncoderParams::fit(&training_users(), std::iter::empty());

        assert_eq!(params.kyc.len(), 4);
        assert_eq!(params.encode_kyc("FAILED"), [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(params.encode_kyc("PENDING"), [0.0, 0.0, 0.0, 1.0]);
        // unseen at fit time: still 4 columns, all zero
        assert_eq!(params.encode_kyc("REVOKED"), [0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_tx_type_vocabulary_includes_missing_category() {
        let tops = [
            Some("CARD_PAYMENT"),
            Some("TOPUP"),
            Some("ATM"),
            Some("BANK_TRANSFER"),
            Some("P2P"),
            None,
        ];
        let params = EncoderParams::fit(&training_users(), tops);

        assert_eq!(params.tx_type.len(), 6);
        let encoded = params.encode_tx_type(None);
        assert_eq!(encoded.iter().sum::<f64>(), 1.0);
        assert_eq!(encoded.len(), 6);

        // even when no training user lacked transactions, the missing
        // category is reserved
        let params = EncoderParams::fit(&training_users(), [Some("TOPUP"), Some("ATM")]);
        assert_eq!(params.tx_type.len(), 3);
        assert_eq!(params.encode_tx_type(None).iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn test_terms_is_latest_is_frozen_at_fit_time() {
        let users = training_users();
        let params = EncoderParams::fit(&users, std::iter::empty());

        assert_eq!(params.terms_is_latest(&users[0]), 1.0);
        assert_eq!(params.terms_is_latest(&users[1]), 0.0);

        // a user from a later batch with a newer version does not match the
        // frozen fit-time maximum
        let mut newer = user(Uuid::from_u128(9), Some("GB"), "PASSED");
        newer.terms_version = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        assert_eq!(params.terms_is_latest(&newer), 0.0);
    }

    #[test]
    fn test_country_is_gb() {
        let users = training_users();
        assert_eq!(country_is_gb(&users[0]), 1.0);
        assert_eq!(country_is_gb(&users[1]), 0.0);
        assert_eq!(country_is_gb(&users[3]), 0.0);
    }
}
