//! Attempt timeline for auditing a run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::decision::Decision;
use super::outcome::AttemptOutcome;

/// One probe of the retry loop.
///
/// Records what the driver observed (outcome) and what the engine decided,
/// so a run can be explained after the fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-indexed attempt number.
    pub attempt: u32,

    /// Time since loop start when the probe returned.
    pub elapsed: Duration,

    pub outcome: AttemptOutcome,

    pub decision: Decision,
}

impl AttemptRecord {
    pub fn new(attempt: u32, elapsed: Duration, outcome: AttemptOutcome, decision: Decision) -> Self {
        Self {
            attempt,
            elapsed,
            outcome,
            decision,
        }
    }

    /// Human-readable timeline line.
    pub fn describe(&self) -> String {
        let action = match self.decision {
            Decision::Finish => "target acquired",
            Decision::Refresh { unexpected: false } => "target taken, refreshing view",
            Decision::Refresh { unexpected: true } => "unexpected failure, refreshing view",
            Decision::Backoff => "not clickable yet, retrying",
        };
        let mut line = format!(
            "attempt {}: {} ({}) at +{:.3}s",
            self.attempt,
            self.outcome.kind(),
            action,
            self.elapsed.as_secs_f64()
        );
        if let Some(detail) = self.outcome.detail() {
            line.push_str(": ");
            line.push_str(detail);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_includes_detail_for_failures() {
        let r = AttemptRecord::new(
            4,
            Duration::from_millis(1250),
            AttemptOutcome::FatalFailure("frame detached".into()),
            Decision::Refresh { unexpected: true },
        );
        assert_eq!(
            r.describe(),
            "attempt 4: fatal (unexpected failure, refreshing view) at +1.250s: frame detached"
        );
    }

    #[test]
    fn describe_contested() {
        let r = AttemptRecord::new(
            1,
            Duration::ZERO,
            AttemptOutcome::Contested,
            Decision::Refresh { unexpected: false },
        );
        assert_eq!(r.describe(), "attempt 1: contested (target taken, refreshing view) at +0.000s");
    }
}
