//! Transaction records as exported from the payments backend

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::de;

/// Transaction state that counts as a successful payment.
pub const STATE_COMPLETED: &str = "COMPLETED";

/// A single card/transfer transaction.
///
/// `amount` is the raw integer amount in currency minor units as exported;
/// the currency normalizer rewrites it to decimal units and fills in
/// `amount_usd`. Once normalized the row is owned by the pipeline run and
/// never mutated again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier
    #[serde(alias = "ID")]
    pub id: Uuid,

    /// ISO currency code of the raw amount
    #[serde(alias = "CURRENCY")]
    pub currency: String,

    /// Amount, in minor units on ingest and decimal units after normalization
    #[serde(alias = "AMOUNT")]
    pub amount: f64,

    /// USD-normalized amount, derived by the currency normalizer
    #[serde(skip_deserializing, default)]
    pub amount_usd: f64,

    /// Processing state (COMPLETED, DECLINED, FAILED, ...)
    #[serde(alias = "STATE")]
    pub state: String,

    /// Creation timestamp, fractional seconds dropped
    #[serde(alias = "CREATED_DATE", deserialize_with = "de::timestamp")]
    pub created_date: NaiveDateTime,

    /// Merchant category, where the acquirer reported one
    #[serde(alias = "MERCHANT_CATEGORY")]
    pub merchant_category: Option<String>,

    /// Merchant country: 3-letter on ingest, 2-letter ISO after the
    /// reference joiner has run
    #[serde(alias = "MERCHANT_COUNTRY")]
    pub merchant_country: Option<String>,

    /// How the card details entered the system (chip, magstripe, ...)
    #[serde(alias = "ENTRY_METHOD")]
    pub entry_method: String,

    /// Owning user; not necessarily present in the users table
    #[serde(alias = "USER_ID")]
    pub user_id: Uuid,

    /// Transaction type (CARD_PAYMENT, TOPUP, ...)
    #[serde(rename = "TYPE")]
    pub tx_type: String,

    /// Originating system
    #[serde(alias = "SOURCE")]
    pub source: String,
}

impl Transaction {
    /// True iff the transaction settled successfully.
    pub fn is_completed(&self) -> bool {
        self.state == STATE_COMPLETED
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::NaiveDate;

    /// Minimal transaction for unit tests.
    pub fn transaction(user_id: Uuid, currency: &str, amount: f64) -> Transaction {
        Transaction {
            id: Uuid::from_u128(amount.abs() as u128 + 1),
            currency: currency.to_string(),
            amount,
            amount_usd: 0.0,
            state: STATE_COMPLETED.to_string(),
            created_date: NaiveDate::from_ymd_opt(2018, 3, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            merchant_category: None,
            merchant_country: None,
            entry_method: "chip".to_string(),
            user_id,
            tx_type: "CARD_PAYMENT".to_string(),
            source: "GAIA".to_string(),
        }
    }
}
