//! Run statistics for a scoring batch.

use std::time::Instant;

use tracing::info;

use crate::types::{Action, Decision};

/// Counters collected while a batch is scored. Single-threaded by design;
/// the whole run is one pass.
pub struct RunMetrics {
    users_scored: u64,
    actions: [u64; 3],
    score_buckets: [u64; 10],
    locked_overrides: u64,
    start_time: Instant,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            users_scored: 0,
            actions: [0; 3],
            score_buckets: [0; 10],
            locked_overrides: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one scored user.
    pub fn record_decision(&mut self, decision: &Decision, action: Action, was_locked: bool) {
        self.users_scored += 1;

        let action_index = match action {
            Action::Nothing => 0,
            Action::AlertAgent => 1,
            Action::LockAndAlert => 2,
        };
        self.actions[action_index] += 1;

        let bucket = ((decision.confidence * 10.0) as usize).min(9);
        self.score_buckets[bucket] += 1;

        if was_locked {
            self.locked_overrides += 1;
        }
    }

    pub fn users_scored(&self) -> u64 {
        self.users_scored
    }

    /// Log the batch summary.
    pub fn print_summary(&self) {
        let elapsed = self.start_time.elapsed();
        info!(
            users = self.users_scored,
            elapsed_ms = elapsed.as_millis() as u64,
            "Scoring run complete"
        );
        info!(
            no_action = self.actions[0],
            alert_agent = self.actions[1],
            lock_and_alert = self.actions[2],
            locked_overrides = self.locked_overrides,
            "Decisions by action"
        );

        let total: u64 = self.score_buckets.iter().sum();
        for (i, &count) in self.score_buckets.iter().enumerate() {
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            let bar = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "confidence {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}
