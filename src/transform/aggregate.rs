//! Per-user aggregation over the normalized transaction table.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use tracing::info;
use uuid::Uuid;

use crate::types::{Transaction, User};

/// Transactions at or above this USD amount qualify a first payment as a
/// success.
pub const FIRST_SUCCESS_MIN_USD: f64 = 10.0;

/// Transactions at or above this USD amount are ignored by the capped
/// maximum aggregate.
pub const AMOUNT_CAP_USD: f64 = 5000.0;

/// Everything the aggregator derives for one user.
///
/// Users without any transactions keep the conservative defaults: false
/// flags, zero amount, no most-frequent values.
#[derive(Debug, Clone, Default)]
pub struct UserAggregates {
    /// The user's earliest transaction completed with amount_usd >= 10
    pub first_success: bool,
    /// Most frequent merchant country across the user's transactions
    pub top_merchant_country: Option<String>,
    /// Most frequent transaction source
    pub top_source: Option<String>,
    /// Most frequent transaction type
    pub top_tx_type: Option<String>,
    /// Most frequent merchant country equals the registration country
    pub countries_match: bool,
    /// Maximum USD amount among transactions strictly below the cap
    pub capped_max_usd: f64,
    /// The user id appears in the transaction table at all
    pub id_check: bool,
}

/// Most frequent value of `attribute` per user.
///
/// Ties are broken toward the lexicographically smallest value, so the
/// winner does not depend on input or hash ordering. Rows where the
/// attribute is missing do not count.
pub fn most_frequent_by<'a, F>(
    transactions: &'a [Transaction],
    attribute: F,
) -> HashMap<Uuid, String>
where
    F: Fn(&'a Transaction) -> Option<&'a str>,
{
    let mut counts: HashMap<Uuid, HashMap<&str, u32>> = HashMap::new();
    for tx in transactions {
        if let Some(value) = attribute(tx) {
            *counts
                .entry(tx.user_id)
                .or_default()
                .entry(value)
                .or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .filter_map(|(user_id, by_value)| {
            by_value
                .into_iter()
                .max_by(|(va, ca), (vb, cb)| ca.cmp(cb).then_with(|| vb.cmp(va)))
                .map(|(value, _)| (user_id, value.to_string()))
        })
        .collect()
}

/// Whether each user's earliest transaction was a successful payment.
///
/// The earliest transaction is the minimum by `created_date`; equal
/// timestamps keep the first record in input order, deterministic for a
/// fixed input ordering.
pub fn first_success(transactions: &[Transaction]) -> HashMap<Uuid, bool> {
    let mut earliest: HashMap<Uuid, &Transaction> = HashMap::new();
    for tx in transactions {
        match earliest.entry(tx.user_id) {
            Entry::Occupied(mut entry) => {
                if tx.created_date < entry.get().created_date {
                    entry.insert(tx);
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(tx);
            }
        }
    }

    earliest
        .into_iter()
        .map(|(user_id, tx)| {
            (
                user_id,
                tx.is_completed() && tx.amount_usd >= FIRST_SUCCESS_MIN_USD,
            )
        })
        .collect()
}

/// Maximum USD amount per user over transactions strictly below the cap.
pub fn capped_max_usd(transactions: &[Transaction]) -> HashMap<Uuid, f64> {
    let mut maxima: HashMap<Uuid, f64> = HashMap::new();
    for tx in transactions.iter().filter(|tx| tx.amount_usd < AMOUNT_CAP_USD) {
        let entry = maxima.entry(tx.user_id).or_insert(tx.amount_usd);
        if tx.amount_usd > *entry {
            *entry = tx.amount_usd;
        }
    }
    maxima
}

/// Run every aggregation and left-join the results onto the user table.
///
/// The returned map has one entry per user row; users without transactions
/// get `UserAggregates::default()`.
pub fn aggregate_users(
    users: &[User],
    transactions: &[Transaction],
) -> HashMap<Uuid, UserAggregates> {
    let first = first_success(transactions);
    let top_country = most_frequent_by(transactions, |tx| tx.merchant_country.as_deref());
    let top_source = most_frequent_by(transactions, |tx| Some(tx.source.as_str()));
    let top_tx_type = most_frequent_by(transactions, |tx| Some(tx.tx_type.as_str()));
    let maxima = capped_max_usd(transactions);
    let seen_user_ids: HashSet<Uuid> = transactions.iter().map(|tx| tx.user_id).collect();

    let aggregates: HashMap<Uuid, UserAggregates> = users
        .iter()
        .map(|user| {
            let top_merchant_country = top_country.get(&user.id).cloned();
            let countries_match = match (&top_merchant_country, &user.country) {
                (Some(merchant), Some(registered)) => merchant == registered,
                _ => false,
            };

            let agg = UserAggregates {
                first_success: first.get(&user.id).copied().unwrap_or(false),
                top_merchant_country,
                top_source: top_source.get(&user.id).cloned(),
                top_tx_type: top_tx_type.get(&user.id).cloned(),
                countries_match,
                capped_max_usd: maxima.get(&user.id).copied().unwrap_or(0.0),
                id_check: seen_user_ids.contains(&user.id),
            };
            (user.id, agg)
        })
        .collect();

    info!(
        users = aggregates.len(),
        with_transactions = seen_user_ids.len(),
        "Per-user aggregation complete"
    );
    aggregates
}
