//! Civil time helpers.
//!
//! すべての「人間が読む時刻」は固定オフセットの civil time で扱う。
//! 既定は UTC+09:00（日本時間）。

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeDelta, Utc};

/// Format used for status records and log lines: `2025-10-22 11:45:00.123`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Format accepted for the configured target instant: `2025-10-22 11:45:00`.
pub const TARGET_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default civil offset in minutes east of UTC.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 9 * 60;

/// Builds a fixed offset from minutes east of UTC.
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

/// UTC+09:00.
pub fn default_offset() -> FixedOffset {
    offset_from_minutes(DEFAULT_UTC_OFFSET_MINUTES).unwrap_or_else(|| Utc.fix())
}

pub fn format_timestamp(at: &DateTime<FixedOffset>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(
    raw: &str,
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    let naive = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)?;
    Ok(localize(naive, offset))
}

/// Parses `YYYY-MM-DD HH:MM:SS` as wall-clock time in `offset`.
pub fn parse_target(
    raw: &str,
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), TARGET_FORMAT)?;
    Ok(localize(naive, offset))
}

fn localize(naive: NaiveDateTime, offset: FixedOffset) -> DateTime<FixedOffset> {
    // A fixed offset has no gaps or folds, so the mapping is always single.
    let utc = naive - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc, offset)
}

/// Log file name for the civil date of `at`: `YYYYMMDD.log`.
pub fn log_file_name(at: &DateTime<FixedOffset>) -> String {
    at.format("%Y%m%d.log").to_string()
}
