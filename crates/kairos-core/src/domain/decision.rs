//! Decision model: what the Retry Engine does after classifying an outcome.
//!
//! `classify` is a pure function (outcome → next action) with no side effects;
//! the engine executes the decision. Budget and attempt-cap checks are not part
//! of it: they run at the top of every iteration, before the next probe.

use serde::{Deserialize, Serialize};

use super::outcome::AttemptOutcome;

/// The next action after one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Terminal: the target is ours.
    Finish,

    /// Reset the driver's view to a fresh baseline, then probe again at once.
    ///
    /// `unexpected` separates a fatal attempt condition from a plain
    /// "already taken" signal; recovery is identical, logging is not.
    Refresh { unexpected: bool },

    /// Sleep the fixed backoff, then probe again on the same view.
    Backoff,
}

/// Maps every outcome to exactly one decision.
pub fn classify(outcome: &AttemptOutcome) -> Decision {
    match outcome {
        AttemptOutcome::Acquired => Decision::Finish,
        AttemptOutcome::Contested => Decision::Refresh { unexpected: false },
        AttemptOutcome::TransientFailure(_) => Decision::Backoff,
        AttemptOutcome::FatalFailure(_) => Decision::Refresh { unexpected: true },
    }
}
