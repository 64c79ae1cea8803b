//! State - Retry Engine の状態
//!
//! # 状態遷移
//! - Idle → Probing
//! - Probing → Acquired（終端）
//! - Probing → Refreshing → Probing（Contested / FatalFailure）
//! - Probing → Backoff → Probing（TransientFailure）
//! - Probing → TimedOut（retry budget 超過、終端）
//! - Probing → Aborted（attempt 上限到達、終端）

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineState {
    Idle,
    Probing,
    Refreshing,
    Backoff,
    Acquired,
    TimedOut,
    Aborted,
}

impl EngineState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EngineState::Acquired | EngineState::TimedOut | EngineState::Aborted
        )
    }
}

/// Why a task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    Acquired,
    RetryBudgetExhausted,
    AttemptCapReached,
    InvalidSchedule,
    SetupFailed,
    CommitFailed,
}

impl TerminationReason {
    /// Operator-facing reason string; distinct per cause.
    pub fn as_str(self) -> &'static str {
        match self {
            TerminationReason::Acquired => "acquired",
            TerminationReason::RetryBudgetExhausted => "retry budget exhausted",
            TerminationReason::AttemptCapReached => "attempt cap reached",
            TerminationReason::InvalidSchedule => "invalid schedule",
            TerminationReason::SetupFailed => "driver setup failed",
            TerminationReason::CommitFailed => "final commit failed",
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_outcome_states_are_terminal() {
        assert!(EngineState::Acquired.is_terminal());
        assert!(EngineState::TimedOut.is_terminal());
        assert!(EngineState::Aborted.is_terminal());
        assert!(!EngineState::Refreshing.is_terminal());
        assert!(!EngineState::Backoff.is_terminal());
    }

    #[test]
    fn budget_and_cap_have_distinct_reasons() {
        assert_ne!(
            TerminationReason::RetryBudgetExhausted.as_str(),
            TerminationReason::AttemptCapReached.as_str()
        );
        assert_eq!(
            TerminationReason::RetryBudgetExhausted.to_string(),
            "retry budget exhausted"
        );
    }
}
