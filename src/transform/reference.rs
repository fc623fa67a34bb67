//! Reference joins: merchant country codes and training-time fraud labels.

use std::collections::{HashMap, HashSet};

use tracing::info;
use uuid::Uuid;

use crate::types::reference::CountryRow;
use crate::types::{Transaction, User};

/// Sentinel for merchant country values that cannot be a 3-letter code.
pub const UNKNOWN_COUNTRY: &str = "UNK";

/// 3-letter to 2-letter ISO country code lookup.
///
/// Built from the countries reference table plus a small manual override
/// set for codes the reference table lacks or mis-maps.
pub struct CountryCodeMap {
    codes: HashMap<String, String>,
}

/// Overrides applied on top of the reference table.
const MANUAL_OVERRIDES: [(&str, &str); 4] = [
    ("ROU", "RO"),
    ("SRB", "CS"),
    ("NSW", "AU"),
    ("MNE", "CS"),
];

impl CountryCodeMap {
    /// Build the lookup from reference rows.
    ///
    /// Rows missing either code are dropped; 3-letter codes are uppercased;
    /// the manual overrides win over the reference table.
    pub fn from_reference(rows: &[CountryRow]) -> Self {
        let mut codes: HashMap<String, String> = rows
            .iter()
            .filter_map(|row| match (&row.code, &row.code3) {
                (Some(code), Some(code3)) if !code.is_empty() && !code3.is_empty() => {
                    Some((code3.to_uppercase(), code.clone()))
                }
                _ => None,
            })
            .collect();

        for (code3, code) in MANUAL_OVERRIDES {
            codes.insert(code3.to_string(), code.to_string());
        }

        info!(entries = codes.len(), "Country code lookup built");
        Self { codes }
    }

    /// Resolve a 3-letter code to its 2-letter equivalent, if known.
    pub fn resolve(&self, code3: &str) -> Option<&str> {
        self.codes.get(code3).map(String::as_str)
    }

    /// Rewrite every transaction's merchant country to its 2-letter form.
    ///
    /// Values longer than 3 characters are first collapsed to the `UNK`
    /// sentinel; codes absent from the lookup pass through unchanged.
    pub fn apply(&self, transactions: &mut [Transaction]) {
        for tx in transactions.iter_mut() {
            if let Some(raw) = tx.merchant_country.as_mut() {
                if raw.len() > 3 {
                    *raw = UNKNOWN_COUNTRY.to_string();
                }
                if let Some(code) = self.resolve(raw) {
                    *raw = code.to_string();
                }
            }
        }
    }
}

/// Mark every user whose id appears in the external fraud-id set.
pub fn label_fraudsters(users: &mut [User], fraud_ids: &HashSet<Uuid>) {
    let mut labeled = 0usize;
    for user in users.iter_mut() {
        user.is_fraudster = fraud_ids.contains(&user.id);
        if user.is_fraudster {
            labeled += 1;
        }
    }
    info!(users = users.len(), fraudsters = labeled, "Fraud labels resolved");
}
