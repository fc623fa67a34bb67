//! Currency normalization: minor units to decimal, then to USD.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::types::reference::{CurrencyDetail, FxRate};
use crate::types::Transaction;

/// Converts raw integer transaction amounts into decimal currency units and
/// derives a USD amount via day-matched FX rates.
///
/// Currencies without a known exponent keep their raw amount. Non-USD rows
/// without a matching rate for their calendar date keep the non-converted
/// amount as the USD figure, so nothing downstream ever sees a missing
/// amount.
pub struct CurrencyNormalizer {
    /// Currency -> decimal exponent, known exponents only
    exponents: HashMap<String, i32>,
    /// (quote currency, calendar date) -> mean USD rate for that day
    usd_rates: HashMap<(String, NaiveDate), f64>,
}

impl CurrencyNormalizer {
    /// Build the lookup tables from the currency details and FX references.
    ///
    /// Only `base_ccy == "USD"` rates participate; multiple observations on
    /// the same calendar day are averaged.
    pub fn new(details: &[CurrencyDetail], fx_rates: &[FxRate]) -> Self {
        let exponents: HashMap<String, i32> = details
            .iter()
            .filter_map(|d| d.exponent.map(|e| (d.currency.clone(), e)))
            .collect();

        let mut sums: HashMap<(String, NaiveDate), (f64, u32)> = HashMap::new();
        for rate in fx_rates.iter().filter(|r| r.base_ccy == "USD") {
            let entry = sums
                .entry((rate.ccy.clone(), rate.ts.date()))
                .or_insert((0.0, 0));
            entry.0 += rate.rate;
            entry.1 += 1;
        }
        let usd_rates = sums
            .into_iter()
            .map(|(key, (sum, count))| (key, sum / count as f64))
            .collect();

        Self { exponents, usd_rates }
    }

    /// Decimal amount for a raw minor-unit amount in `currency`.
    ///
    /// Unknown-exponent currencies pass through unchanged.
    pub fn to_cash(&self, amount: f64, currency: &str) -> f64 {
        match self.exponents.get(currency) {
            Some(&exponent) => amount / 10f64.powi(exponent),
            None => amount,
        }
    }

    /// Mean USD rate for `currency` on `date`, if one was observed.
    pub fn usd_rate(&self, currency: &str, date: NaiveDate) -> Option<f64> {
        self.usd_rates
            .get(&(currency.to_string(), date))
            .copied()
    }

    /// Normalize a batch of transactions.
    ///
    /// Consumes and returns the batch; the caller's other tables are never
    /// touched. After this call `amount` holds decimal units and
    /// `amount_usd` is populated for every row.
    pub fn normalize(&self, transactions: Vec<Transaction>) -> Vec<Transaction> {
        let mut missing_rates = 0usize;

        let normalized: Vec<Transaction> = transactions
            .into_iter()
            .map(|mut tx| {
                tx.amount = self.to_cash(tx.amount, &tx.currency);
                tx.amount_usd = if tx.currency == "USD" {
                    tx.amount
                } else {
                    match self.usd_rate(&tx.currency, tx.created_date.date()) {
                        Some(rate) => tx.amount * rate,
                        None => {
                            missing_rates += 1;
                            debug!(
                                currency = %tx.currency,
                                date = %tx.created_date.date(),
                                "No FX rate for day, keeping non-converted amount"
                            );
                            tx.amount
                        }
                    }
                };
                tx
            })
            .collect();

        info!(
            transactions = normalized.len(),
            missing_rates, "Currency normalization complete"
        );
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::test_support::transaction;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn details() -> Vec<CurrencyDetail> {
        vec![
            CurrencyDetail {
                currency: "USD".to_string(),
                iso_code: Some(840),
                exponent: Some(2),
                is_crypto: false,
            },
            CurrencyDetail {
                currency: "GBP".to_string(),
                iso_code: Some(826),
                exponent: Some(2),
                is_crypto: false,
            },
            CurrencyDetail {
                currency: "JPY".to_string(),
                iso_code: Some(392),
                exponent: Some(0),
                is_crypto: false,
            },
            CurrencyDetail {
                currency: "XAU".to_string(),
                iso_code: None,
                exponent: None,
                is_crypto: false,
            },
        ]
    }

    fn fx(ccy: &str, day: u32, hour: u32, rate: f64) -> FxRate {
        FxRate {
            ts: NaiveDate::from_ymd_opt(2018, 3, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            base_ccy: "USD".to_string(),
            ccy: ccy.to_string(),
            rate,
        }
    }

    #[test]
    fn test_to_cash_divides_by_exponent() {
        let normalizer = CurrencyNormalizer::new(&details(), &[]);

        assert_eq!(normalizer.to_cash(2750.0, "GBP"), 27.5);
        assert_eq!(normalizer.to_cash(1000.0, "JPY"), 1000.0);
        // unknown exponent: raw amount passes through
        assert_eq!(normalizer.to_cash(5000.0, "XAU"), 5000.0);
    }

    #[test]
    fn test_to_cash_is_monotonic() {
        let normalizer = CurrencyNormalizer::new(&details(), &[]);
        let amounts = [0.0, 1.0, 250.0, 999999.0];
        for pair in amounts.windows(2) {
            assert!(normalizer.to_cash(pair[0], "GBP") < normalizer.to_cash(pair[1], "GBP"));
        }
    }

    #[test]
    fn test_same_day_rates_are_averaged() {
        let normalizer =
            CurrencyNormalizer::new(&details(), &[fx("GBP", 1, 9, 1.3), fx("GBP", 1, 17, 1.5)]);

        let date = NaiveDate::from_ymd_opt(2018, 3, 1).unwrap();
        assert_eq!(normalizer.usd_rate("GBP", date), Some(1.4));
        assert_eq!(normalizer.usd_rate("GBP", date.succ_opt().unwrap()), None);
    }

    #[test]
    fn test_normalize_usd_and_converted_rows() {
        let normalizer = CurrencyNormalizer::new(&details(), &[fx("GBP", 1, 9, 1.4)]);
        let user = Uuid::from_u128(7);

        let batch = vec![
            transaction(user, "USD", 1000.0),
            transaction(user, "GBP", 2000.0),
        ];
        let normalized = normalizer.normalize(batch);

        assert_eq!(normalized[0].amount, 10.0);
        assert_eq!(normalized[0].amount_usd, 10.0);
        assert_eq!(normalized[1].amount, 20.0);
        assert!((normalized[1].amount_usd - 28.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_rate_falls_back_to_unconverted_amount() {
        // JPY with exponent 0 and no FX row at all: the 1000 raw amount
        // survives as the USD figure instead of crashing or going missing.
        let normalizer = CurrencyNormalizer::new(&details(), &[]);
        let batch = vec![transaction(Uuid::from_u128(7), "JPY", 1000.0)];

        let normalized = normalizer.normalize(batch);

        assert_eq!(normalized[0].amount, 1000.0);
        assert_eq!(normalized[0].amount_usd, 1000.0);
    }
}
