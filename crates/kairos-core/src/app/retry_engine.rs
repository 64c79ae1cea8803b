//! RetryEngine - probe → classify → reset / backoff / 終了 のループ
//!
//! # フロー（1 反復ごと、この順で判定）
//! 1. deadline（loop 開始 + retry budget）に達していれば TimedOut
//! 2. attempt 数が上限に達していれば Aborted
//! 3. driver.probe() → classify() → Decision
//!    - Finish: Acquired で終了
//!    - Refresh: reset_view してすぐ次の probe へ（待ちなし）
//!    - Backoff: 固定の短い待ちを入れて次の probe へ（reset なし）
//!
//! attempt 単位の失敗はここで吸収し、呼び出し側へは EngineReport だけを返す。
//! reset_view 自体の失敗もログに残して backoff 分待ち、ループを続ける。

use std::time::Duration;

use tokio::time::Instant;

use crate::domain::{AttemptRecord, Decision, EngineState, TaskConfig, classify};
use crate::ports::{ActionDriver, Logger};

/// Bounds of one retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retry_budget: Duration,
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl From<&TaskConfig> for RetryPolicy {
    fn from(config: &TaskConfig) -> Self {
        Self {
            retry_budget: config.retry_budget,
            max_attempts: config.max_attempts,
            backoff: config.backoff,
        }
    }
}

/// What happened inside one run of the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineReport {
    /// Always terminal: Acquired, TimedOut or Aborted.
    pub state: EngineState,
    pub attempts: u32,
    pub resets: u32,
    pub backoffs: u32,
    /// Time from loop start to termination.
    pub elapsed: Duration,
    pub timeline: Vec<AttemptRecord>,
}

pub struct RetryEngine {
    policy: RetryPolicy,
}

impl RetryEngine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn run(&self, driver: &dyn ActionDriver, logger: &dyn Logger) -> EngineReport {
        let loop_start = Instant::now();
        // a budget too large to represent never expires; the attempt cap still bounds the loop
        let deadline = loop_start.checked_add(self.policy.retry_budget);
        let max_attempts = self.policy.max_attempts.max(1);

        let mut state = EngineState::Idle;
        let mut attempts = 0u32;
        let mut resets = 0u32;
        let mut backoffs = 0u32;
        let mut timeline = Vec::new();

        tracing::debug!(?state, policy = ?self.policy, "retry loop start");

        while !state.is_terminal() {
            // the first probe always runs, so a started loop reports at least one attempt
            let expired = deadline.is_some_and(|deadline| Instant::now() >= deadline);
            if attempts > 0 && expired {
                state = EngineState::TimedOut;
                logger.record(&format!(
                    "retry budget of {:.3}s exhausted after {attempts} attempts",
                    self.policy.retry_budget.as_secs_f64()
                ));
                break;
            }
            if attempts >= max_attempts {
                state = EngineState::Aborted;
                logger.record(&format!("attempt cap of {attempts} reached"));
                break;
            }

            state = EngineState::Probing;
            let outcome = driver.probe().await;
            attempts += 1;

            let decision = classify(&outcome);
            let record = AttemptRecord::new(attempts, loop_start.elapsed(), outcome, decision);
            logger.record(&record.describe());
            tracing::debug!(attempt = attempts, ?decision, "attempt classified");
            timeline.push(record);

            match decision {
                Decision::Finish => state = EngineState::Acquired,
                Decision::Refresh { .. } => {
                    state = EngineState::Refreshing;
                    resets += 1;
                    if let Err(e) = driver.reset_view().await {
                        tracing::warn!(attempt = attempts, error = %e, "view reset failed");
                        logger.record(&format!("view reset failed: {e}"));
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                }
                Decision::Backoff => {
                    state = EngineState::Backoff;
                    backoffs += 1;
                    tokio::time::sleep(self.policy.backoff).await;
                }
            }
        }

        let elapsed = loop_start.elapsed();
        tracing::info!(
            ?state,
            attempts,
            resets,
            backoffs,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "retry loop end"
        );

        EngineReport {
            state,
            attempts,
            resets,
            backoffs,
            elapsed,
            timeline,
        }
    }
}
