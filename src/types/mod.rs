//! Type definitions for the fraud-scoring pipeline

pub mod decision;
pub mod reference;
pub mod transaction;
pub mod user;

pub use decision::{Action, Decision, DecisionThresholds};
pub use reference::{CountryRow, CurrencyDetail, FxRate};
pub use transaction::Transaction;
pub use user::User;

pub(crate) mod de {
    //! Serde helpers for the quirks of the raw CSV exports.

    use chrono::{NaiveDate, NaiveDateTime, Timelike};
    use serde::{Deserialize, Deserializer};

    /// `TERMS_VERSION` sentinel for users that never accepted any terms.
    pub const TERMS_VERSION_SENTINEL: &str = "1900-01-01";

    /// Parse a `YYYY-MM-DD HH:MM:SS[.fff]` timestamp, truncating any
    /// fractional seconds.
    pub fn timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        let ts = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S%.f")?;
        Ok(ts.with_nanosecond(0).unwrap_or(ts))
    }

    /// The exports encode booleans as 0/1 integers or `True`/`False` text.
    pub fn int_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        match raw.trim() {
            "0" | "false" | "False" | "FALSE" | "" => Ok(false),
            "1" | "true" | "True" | "TRUE" => Ok(true),
            other => Err(serde::de::Error::custom(format!(
                "expected a 0/1 or true/false value, got {other:?}"
            ))),
        }
    }

    /// `TERMS_VERSION` date with the 1900-01-01 sentinel for missing values.
    pub fn date_or_sentinel<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        let raw = match raw.as_deref().map(str::trim) {
            None | Some("") => TERMS_VERSION_SENTINEL,
            Some(s) => s,
        };
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(serde::de::Error::custom)
    }

    /// Currency exponent column: an empty field and the legacy -1 sentinel
    /// both mean the exponent is unknown.
    pub fn exponent<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<f64>::deserialize(deserializer)?;
        Ok(raw.map(|e| e as i32).filter(|&e| e >= 0))
    }
}
