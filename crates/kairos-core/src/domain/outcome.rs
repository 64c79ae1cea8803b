//! Attempt outcome: what the Action Driver reports for one probe.
//!
//! The driver owns the availability signal (e.g. a categorical status colour on
//! the target surface); the core only sees the classified result.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classified result of one probe-and-attempt cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The target was claimed by this attempt.
    Acquired,

    /// The availability signal says a competitor holds the target.
    Contested,

    /// The interaction did not complete within its micro-timeout.
    TransientFailure(String),

    /// Unexpected condition; the surface must be re-synchronised.
    FatalFailure(String),
}

impl AttemptOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            AttemptOutcome::Acquired => OutcomeKind::Acquired,
            AttemptOutcome::Contested => OutcomeKind::Contested,
            AttemptOutcome::TransientFailure(_) => OutcomeKind::Transient,
            AttemptOutcome::FatalFailure(_) => OutcomeKind::Fatal,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            AttemptOutcome::TransientFailure(d) | AttemptOutcome::FatalFailure(d) => Some(d),
            AttemptOutcome::Acquired | AttemptOutcome::Contested => None,
        }
    }
}

/// Field-less view of [`AttemptOutcome`], used in timelines and scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Acquired,
    Contested,
    Transient,
    Fatal,
}

impl OutcomeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeKind::Acquired => "acquired",
            OutcomeKind::Contested => "contested",
            OutcomeKind::Transient => "transient",
            OutcomeKind::Fatal => "fatal",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown outcome {0:?}: expected acquired, contested, transient or fatal")]
pub struct UnknownOutcome(pub String);

impl FromStr for OutcomeKind {
    type Err = UnknownOutcome;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "acquired" => Ok(OutcomeKind::Acquired),
            "contested" => Ok(OutcomeKind::Contested),
            "transient" => Ok(OutcomeKind::Transient),
            "fatal" => Ok(OutcomeKind::Fatal),
            _ => Err(UnknownOutcome(s.to_string())),
        }
    }
}
