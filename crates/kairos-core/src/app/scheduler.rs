//! Scheduler - 絶対時刻までの待機
//!
//! # 時刻の扱い
//! - 「いつ」は Clock（civil time）で決める
//! - 「どれだけ待つか」は tokio のタイマーで待つ
//!
//! 待機後にもう一度 Clock を読み、まだ手前なら残りを待ち直す。
//! 過去の時刻を渡された場合は待たずに戻る（負の待機もエラーもなし）。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};

use crate::domain::InvalidSchedule;
use crate::ports::Clock;

pub struct Scheduler {
    clock: Arc<dyn Clock>,
    engage_lead: Duration,
}

impl Scheduler {
    /// `engage_lead` is the short lead before the target at which the
    /// retry loop is released.
    pub fn new(clock: Arc<dyn Clock>, engage_lead: Duration) -> Self {
        Self { clock, engage_lead }
    }

    /// Fails unless `target` is strictly after the current instant.
    pub fn validate(&self, target: DateTime<FixedOffset>) -> Result<(), InvalidSchedule> {
        let now = self.clock.now();
        if target <= now {
            return Err(InvalidSchedule { target, now });
        }
        Ok(())
    }

    /// `target - lead`: when the driver is set up.
    pub fn compute_arm_instant(
        &self,
        target: DateTime<FixedOffset>,
        lead: Duration,
    ) -> DateTime<FixedOffset> {
        earlier_by(target, lead)
    }

    /// `target - engage_lead`: when the window is about to open.
    pub fn compute_engage_instant(&self, target: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        earlier_by(target, self.engage_lead)
    }

    /// Returns once the clock has reached `instant`.
    pub async fn suspend_until(&self, instant: DateTime<FixedOffset>) {
        loop {
            // negative deltas fail to convert: already past
            let Ok(remaining) = (instant - self.clock.now()).to_std() else {
                return;
            };
            if remaining.is_zero() {
                return;
            }
            tracing::trace!(
                remaining_ms = u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
                "suspending"
            );
            tokio::time::sleep(remaining).await;
        }
    }
}

fn earlier_by(at: DateTime<FixedOffset>, by: Duration) -> DateTime<FixedOffset> {
    TimeDelta::from_std(by)
        .ok()
        .and_then(|by| at.checked_sub_signed(by))
        .unwrap_or_else(|| DateTime::<Utc>::MIN_UTC.with_timezone(at.offset()))
}
