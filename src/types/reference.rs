//! Reference tables: country codes, currency details, FX rates

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::de;

/// One row of the countries reference table. Rows with a missing code on
/// either side are dropped when the lookup is built.
#[derive(Debug, Clone, Deserialize)]
pub struct CountryRow {
    /// 2-letter ISO code
    pub code: Option<String>,
    /// 3-letter ISO code
    pub code3: Option<String>,
}

/// Currency metadata. An unknown exponent excludes the currency from minor
/// unit normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyDetail {
    #[serde(alias = "currency", alias = "ccy")]
    pub currency: String,

    pub iso_code: Option<i32>,

    #[serde(deserialize_with = "de::exponent")]
    pub exponent: Option<i32>,

    #[serde(deserialize_with = "de::int_bool")]
    pub is_crypto: bool,
}

/// One long-form FX rate observation: `rate` converts one unit of
/// `base_ccy` into `ccy` at `ts`.
#[derive(Debug, Clone, Serialize)]
pub struct FxRate {
    pub ts: NaiveDateTime,
    pub base_ccy: String,
    pub ccy: String,
    pub rate: f64,
}

/// A user id known to be fraudulent, from the externally curated list.
#[derive(Debug, Clone, Deserialize)]
pub struct FraudsterRow {
    pub user_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_detail_unknown_exponent() {
        let data = "\
currency,iso_code,exponent,is_crypto
USD,840,2,False
XAU,959,,False
BTC,,-1,True
";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let rows: Vec<CurrencyDetail> = reader.deserialize().map(Result::unwrap).collect();

        assert_eq!(rows[0].exponent, Some(2));
        assert_eq!(rows[1].exponent, None);
        assert_eq!(rows[2].exponent, None);
        assert!(rows[2].is_crypto);
    }
}
