//! User records as exported from the accounts backend

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::de;

/// Account state that forces the fraud override at decision time.
pub const STATE_LOCKED: &str = "LOCKED";

/// One registered user.
///
/// `is_fraudster` only carries meaning at training time, where the reference
/// joiner derives it from the external fraud-id list; inference batches leave
/// it false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    #[serde(alias = "ID")]
    pub id: Uuid,

    /// Whether an email address is on file (0/1 in the export)
    #[serde(alias = "HAS_EMAIL", deserialize_with = "de::int_bool")]
    pub has_email: bool,

    /// Country of the registered phone number
    #[serde(alias = "PHONE_COUNTRY")]
    pub phone_country: Option<String>,

    /// Training-time label, resolved from the external fraud-id set
    #[serde(skip_deserializing, default)]
    pub is_fraudster: bool,

    /// Latest accepted terms version; 1900-01-01 when never accepted
    #[serde(alias = "TERMS_VERSION", deserialize_with = "de::date_or_sentinel")]
    pub terms_version: NaiveDate,

    /// Registration timestamp
    #[serde(alias = "CREATED_DATE", deserialize_with = "de::timestamp")]
    pub created_date: NaiveDateTime,

    /// Account state (ACTIVE, LOCKED, ...)
    #[serde(alias = "STATE")]
    pub state: String,

    /// Registration country, 2-letter ISO
    #[serde(alias = "COUNTRY")]
    pub country: Option<String>,

    /// Year of birth
    #[serde(alias = "BIRTH_YEAR")]
    pub birth_year: Option<i32>,

    /// Know-Your-Customer status (PASSED, FAILED, ...)
    #[serde(alias = "KYC")]
    pub kyc: String,

    /// Count of failed sign-in attempts
    #[serde(alias = "FAILED_SIGN_IN_ATTEMPTS")]
    pub failed_sign_in_attempts: Option<i64>,
}

impl User {
    /// True iff the account has been locked by operations.
    pub fn is_locked(&self) -> bool {
        self.state == STATE_LOCKED
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Minimal user for unit tests.
    pub fn user(id: Uuid, country: Option<&str>, kyc: &str) -> User {
        User {
            id,
            has_email: true,
            phone_country: country.map(str::to_string),
            is_fraudster: false,
            terms_version: NaiveDate::from_ymd_opt(2018, 5, 25).unwrap(),
            created_date: NaiveDate::from_ymd_opt(2017, 8, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            state: "ACTIVE".to_string(),
            country: country.map(str::to_string),
            birth_year: Some(1985),
            kyc: kyc.to_string(),
            failed_sign_in_attempts: Some(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_deserializes_with_sentinel_terms_version() {
        let data = "\
ID,HAS_EMAIL,PHONE_COUNTRY,TERMS_VERSION,CREATED_DATE,STATE,COUNTRY,BIRTH_YEAR,KYC,FAILED_SIGN_IN_ATTEMPTS
00000000-0000-0000-0000-0000000000aa,1,GB,,2017-08-06 07:33:33.341,ACTIVE,GB,1971,PASSED,0
";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let user: User = reader.deserialize().next().unwrap().unwrap();

        assert!(user.has_email);
        assert_eq!(
            user.terms_version,
            NaiveDate::from_ymd_opt(1900, 1, 1).unwrap()
        );
        assert!(!user.is_fraudster);
        assert!(!user.is_locked());
    }

    #[test]
    fn test_locked_state() {
        let mut user = test_support::user(Uuid::from_u128(1), Some("GB"), "PASSED");
        assert!(!user.is_locked());
        user.state = STATE_LOCKED.to_string();
        assert!(user.is_locked());
    }
}
