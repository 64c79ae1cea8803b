//! Clock port - 時刻の抽象化
//!
//! civil time（固定オフセット）の「いま」を返す。待機そのものは tokio の
//! タイマーで行うので、Clock は読むだけ。

use std::sync::{Arc, Mutex};

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};

use crate::domain::civil;

/// Clock は現在時刻を提供
///
/// # テスト容易性
/// - trait により時刻を差し替え可能
/// - テストでは FixedClock / AnchoredClock を使用
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<FixedOffset> {
        (**self).now()
    }
}

/// Wall clock rendered in a fixed civil offset (default UTC+09:00).
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(civil::default_offset())
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Clock pinned to an instant until moved explicitly.
#[derive(Debug)]
pub struct FixedClock {
    at: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(at: DateTime<FixedOffset>) -> Self {
        Self { at: Mutex::new(at) }
    }

    pub fn set(&self, at: DateTime<FixedOffset>) {
        *self.at.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.at.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Civil clock that advances with tokio's clock from a chosen starting instant.
///
/// Under a paused tokio runtime it moves only when tokio time moves, which
/// makes schedules that span minutes testable in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct AnchoredClock {
    at: DateTime<FixedOffset>,
    started: tokio::time::Instant,
}

impl AnchoredClock {
    pub fn new(at: DateTime<FixedOffset>) -> Self {
        Self {
            at,
            started: tokio::time::Instant::now(),
        }
    }
}

impl Clock for AnchoredClock {
    fn now(&self) -> DateTime<FixedOffset> {
        TimeDelta::from_std(self.started.elapsed())
            .ok()
            .and_then(|elapsed| self.at.checked_add_signed(elapsed))
            .unwrap_or(self.at)
    }
}
