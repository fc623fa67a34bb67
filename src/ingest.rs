//! CSV ingestion for the raw data exports.
//!
//! Each table loads independently: a malformed row fails that table's load
//! as a whole without touching tables that were already read. The exports
//! carry a leading unnamed pandas index column, which the header-driven
//! deserialization simply ignores.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::types::de;
use crate::types::reference::{CountryRow, CurrencyDetail, FraudsterRow, FxRate};
use crate::types::{Transaction, User};

const INPUT_HINT: &str = "place the raw data exports at the paths configured in config/config.toml";

fn open(path: &Path, hint: &'static str) -> Result<File> {
    File::open(path).map_err(|source| PipelineError::MissingInput {
        path: path.to_path_buf(),
        hint,
        source,
    })
}

fn load_table<T: DeserializeOwned>(path: &Path, table: &'static str) -> Result<Vec<T>> {
    let file = open(path, INPUT_HINT)?;
    let mut reader = csv::Reader::from_reader(file);
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()
        .map_err(|source| PipelineError::Schema {
            table,
            source: source.into(),
        })?;

    info!(table, rows = rows.len(), "Table loaded");
    Ok(rows)
}

/// Load the transactions export.
pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    load_table(path, "transactions")
}

/// Load the users export.
pub fn load_users(path: &Path) -> Result<Vec<User>> {
    load_table(path, "users")
}

/// Load the countries reference table.
pub fn load_countries(path: &Path) -> Result<Vec<CountryRow>> {
    load_table(path, "countries")
}

/// Load the currency details reference table.
pub fn load_currency_details(path: &Path) -> Result<Vec<CurrencyDetail>> {
    load_table(path, "currency_details")
}

/// Load the externally curated fraudster id list into a lookup set.
pub fn load_fraudster_ids(path: &Path) -> Result<HashSet<Uuid>> {
    let rows: Vec<FraudsterRow> = load_table(path, "fraudsters")?;
    Ok(rows.into_iter().map(|r| r.user_id).collect())
}

/// Load the wide-form FX rates export and melt it to long form.
///
/// The export has one timestamp column (unnamed, first) and one column per
/// 6-letter currency pair, e.g. `USDJPY`. Each non-empty cell becomes one
/// `(ts, base_ccy, ccy, rate)` row; empty cells are skipped.
pub fn load_fx_rates(path: &Path) -> Result<Vec<FxRate>> {
    let file = open(path, INPUT_HINT)?;
    let mut reader = csv::Reader::from_reader(file);

    type Source = Box<dyn std::error::Error + Send + Sync>;
    let schema = |source: Source| PipelineError::Schema {
        table: "fx_rates",
        source,
    };

    let headers = reader
        .headers()
        .map_err(|e| schema(e.into()))?
        .clone();

    let mut rates = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| schema(e.into()))?;
        let ts_raw = record.get(0).unwrap_or_default();
        let ts = de::parse_timestamp(ts_raw).map_err(|e| schema(e.into()))?;

        for (header, value) in headers.iter().zip(record.iter()).skip(1) {
            if value.trim().is_empty() {
                continue;
            }
            if header.len() <= 3 {
                debug!(column = header, "Skipping non-pair fx column");
                continue;
            }
            let rate: f64 = value.trim().parse().map_err(|e: std::num::ParseFloatError| {
                schema(e.into())
            })?;
            rates.push(FxRate {
                ts,
                base_ccy: header[..3].to_string(),
                ccy: header[3..].to_string(),
                rate,
            });
        }
    }

    info!(table = "fx_rates", rows = rates.len(), "Table loaded");
    Ok(rates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    fn temp_csv(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("fraud-scoring-{name}-{}", std::process::id()));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_missing_input_reports_hint() {
        let err = load_users(Path::new("/definitely/not/here.csv")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("is missing"));
        assert!(msg.contains("config/config.toml"));
    }

    #[test]
    fn test_malformed_row_fails_whole_table() {
        let path = temp_csv(
            "bad-users",
            "\
ID,HAS_EMAIL,PHONE_COUNTRY,TERMS_VERSION,CREATED_DATE,STATE,COUNTRY,BIRTH_YEAR,KYC,FAILED_SIGN_IN_ATTEMPTS
00000000-0000-0000-0000-0000000000aa,1,GB,2018-05-25,2017-08-06 07:33:33,ACTIVE,GB,1971,PASSED,0
not-a-uuid,1,GB,2018-05-25,2017-08-06 07:33:33,ACTIVE,GB,1971,PASSED,0
",
        );
        let err = load_users(&path).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Schema { table: "users", .. }
        ));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_fx_rates_melt_to_long_form() {
        let path = temp_csv(
            "fx",
            "\
,USDJPY,USDEUR
2018-03-01 09:00:00,107.5,0.81
2018-03-01 15:00:00,108.5,
",
        );
        let rates = load_fx_rates(&path).unwrap();

        assert_eq!(rates.len(), 3);
        assert_eq!(rates[0].base_ccy, "USD");
        assert_eq!(rates[0].ccy, "JPY");
        assert_eq!(rates[0].rate, 107.5);
        assert_eq!(
            rates[0].ts.date(),
            NaiveDate::from_ymd_opt(2018, 3, 1).unwrap()
        );
        assert_eq!(rates[1].ccy, "EUR");
        // the empty USDEUR cell on the second row is skipped
        assert_eq!(rates[2].ccy, "JPY");
        assert_eq!(rates[2].rate, 108.5);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_fraudster_ids_become_a_set() {
        let path = temp_csv(
            "fraudsters",
            "\
,user_id
0,00000000-0000-0000-0000-0000000000aa
1,00000000-0000-0000-0000-0000000000bb
",
        );
        let ids = load_fraudster_ids(&path).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&Uuid::from_u128(0xaa)));
        std::fs::remove_file(path).ok();
    }
}
