//! Decision data structures

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Action taken for a scored user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// No action, the account looks clean
    Nothing,
    /// Route to a fraud agent for review
    AlertAgent,
    /// Lock the account and route to a fraud agent
    LockAndAlert,
}

impl Action {
    /// Map a fraud probability to an action.
    ///
    /// The boundaries are closed exactly as the patrol rules state them:
    /// a confidence of 0.6 is still no action, a confidence of 0.9 already
    /// locks.
    pub fn from_confidence(confidence: f64, thresholds: &DecisionThresholds) -> Self {
        if confidence >= thresholds.lock {
            Action::LockAndAlert
        } else if confidence > thresholds.alert {
            Action::AlertAgent
        } else {
            Action::Nothing
        }
    }

    /// The operator-facing label for this action.
    pub fn label(&self) -> &'static str {
        match self {
            Action::Nothing => "NOTHING: NON-FRAUDSTER",
            Action::AlertAgent => "ALERT AGENT: POSSIBLE FRAUDSTER",
            Action::LockAndAlert => "LOCK AND ALERT AGENT: LIKELY FRAUDSTER",
        }
    }
}

/// Configurable decision thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionThresholds {
    /// Above this confidence an agent is alerted
    pub alert: f64,
    /// At or above this confidence the account is locked
    pub lock: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self { alert: 0.6, lock: 0.9 }
    }
}

/// Scored outcome for one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// The scored user
    #[serde(rename = "ID")]
    pub user_id: Uuid,

    /// Binary fraud prediction, after the locked-account override
    #[serde(rename = "Prediction")]
    pub prediction: u8,

    /// Fraud probability, after the locked-account override
    #[serde(rename = "Confidence")]
    pub confidence: f64,
}

impl Decision {
    /// The action this decision maps to under the given thresholds.
    pub fn action(&self, thresholds: &DecisionThresholds) -> Action {
        Action::from_confidence(self.confidence, thresholds)
    }
}
