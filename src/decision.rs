//! Decision engine: model scores to operator actions.

use std::collections::HashMap;

use ndarray::Array2;
use tracing::info;
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::models::FraudClassifier;
use crate::types::{Action, Decision, DecisionThresholds, User};

/// Combine a model output with the account state.
///
/// A locked account forces the maximal fraud outcome no matter what the
/// model said; everything else passes the model output through.
pub fn decide(user: &User, prediction: u8, confidence: f64) -> Decision {
    if user.is_locked() {
        Decision {
            user_id: user.id,
            prediction: 1,
            confidence: 1.0,
        }
    } else {
        Decision {
            user_id: user.id,
            prediction,
            confidence,
        }
    }
}

/// Score every user against the classifier, one feature row per user,
/// applying the locked-account override.
pub fn score_users(
    users: &[User],
    features: &Array2<f64>,
    classifier: &dyn FraudClassifier,
) -> anyhow::Result<Vec<Decision>> {
    let mut decisions = Vec::with_capacity(users.len());
    let mut overridden = 0usize;

    for (user, row) in users.iter().zip(features.rows()) {
        let row: Vec<f64> = row.to_vec();
        let confidence = classifier.predict_proba(&row)?;
        let prediction = classifier.predict(&row)?;

        if user.is_locked() {
            overridden += 1;
        }
        decisions.push(decide(user, prediction, confidence));
    }

    info!(
        users = decisions.len(),
        locked_overrides = overridden,
        "Batch scored"
    );
    Ok(decisions)
}

/// Per-run decision lookup keyed by user id.
///
/// An explicit map owned by the run; looking up an id that was not part of
/// the scored batch is a hard error.
pub struct DecisionTable {
    decisions: HashMap<Uuid, Decision>,
    thresholds: DecisionThresholds,
}

impl DecisionTable {
    pub fn new(decisions: Vec<Decision>, thresholds: DecisionThresholds) -> Self {
        Self {
            decisions: decisions.into_iter().map(|d| (d.user_id, d)).collect(),
            thresholds,
        }
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn get(&self, user_id: Uuid) -> Option<&Decision> {
        self.decisions.get(&user_id)
    }

    /// The action for a scored user.
    pub fn patrol(&self, user_id: Uuid) -> Result<Action> {
        self.decisions
            .get(&user_id)
            .map(|d| d.action(&self.thresholds))
            .ok_or(PipelineError::UnknownUser(user_id))
    }
}
