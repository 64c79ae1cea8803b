//! Status record: the single externally-pollable view of a task.
//!
//! Wire format (one record per task id, overwritten on every write):
//!
//! ```text
//! 2025-10-22 11:43:00.004@Running
//! 2025-10-22 11:45:01.532@Success#121.528s
//! 2025-10-22 11:46:00.017@Failure#retry budget exhausted#180.013s
//! ```

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::civil::{format_timestamp, parse_timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Running,
    Success,
    /// One-line failure summary (never contains `#`, `@` or newlines).
    Failure(String),
}

impl Phase {
    pub fn failure(summary: impl AsRef<str>) -> Self {
        Phase::Failure(sanitize_summary(summary.as_ref()))
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Phase::Running)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub at: DateTime<FixedOffset>,
    pub phase: Phase,
    /// Set on completion.
    pub elapsed: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusParseError {
    #[error("missing '@' separator")]
    MissingSeparator,
    #[error("bad timestamp {0:?}")]
    Timestamp(String),
    #[error("unknown phase {0:?}")]
    Phase(String),
    #[error("bad elapsed {0:?}")]
    Elapsed(String),
}

impl StatusRecord {
    pub fn running(at: DateTime<FixedOffset>) -> Self {
        Self {
            at,
            phase: Phase::Running,
            elapsed: None,
        }
    }

    pub fn success(at: DateTime<FixedOffset>, elapsed: Duration) -> Self {
        Self {
            at,
            phase: Phase::Success,
            elapsed: Some(elapsed),
        }
    }

    pub fn failure(
        at: DateTime<FixedOffset>,
        summary: impl AsRef<str>,
        elapsed: Option<Duration>,
    ) -> Self {
        Self {
            at,
            phase: Phase::failure(summary),
            elapsed,
        }
    }

    /// Renders the full record as a single string (written in one operation).
    pub fn render(&self) -> String {
        let mut out = format_timestamp(&self.at);
        out.push('@');
        match &self.phase {
            Phase::Running => out.push_str("Running"),
            Phase::Success => out.push_str("Success"),
            Phase::Failure(summary) => {
                out.push_str("Failure#");
                out.push_str(summary);
            }
        }
        if let Some(elapsed) = self.elapsed {
            out.push_str(&format!("#{:.3}s", elapsed.as_secs_f64()));
        }
        out
    }

    pub fn parse(raw: &str, offset: FixedOffset) -> Result<Self, StatusParseError> {
        let raw = raw.trim();
        let (ts, rest) = raw
            .split_once('@')
            .ok_or(StatusParseError::MissingSeparator)?;
        let at = parse_timestamp(ts, offset)
            .map_err(|_| StatusParseError::Timestamp(ts.to_string()))?;

        let mut parts: Vec<&str> = rest.split('#').collect();
        let elapsed = if has_elapsed(&parts) {
            let last = parts.pop().unwrap_or_default();
            let elapsed = last
                .strip_suffix('s')
                .and_then(|n| n.parse::<f64>().ok())
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .ok_or_else(|| StatusParseError::Elapsed(last.to_string()))?;
            Some(elapsed)
        } else {
            None
        };

        let phase = match parts.as_slice() {
            ["Running"] => Phase::Running,
            ["Success"] => Phase::Success,
            ["Failure", summary] => Phase::Failure((*summary).to_string()),
            _ => return Err(StatusParseError::Phase(rest.to_string())),
        };

        Ok(Self { at, phase, elapsed })
    }
}

/// `Success#Ns` and `Failure#summary#Ns` carry a trailing elapsed segment.
fn has_elapsed(parts: &[&str]) -> bool {
    matches!(parts, ["Success", _] | ["Failure", _, _])
}

impl fmt::Display for StatusRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn sanitize_summary(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '#' | '@' | '\n' | '\r' | '\t' => ' ',
            other => other,
        })
        .collect();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::civil::{default_offset, parse_timestamp};

    fn at(raw: &str) -> DateTime<FixedOffset> {
        parse_timestamp(raw, default_offset()).unwrap()
    }

    #[test]
    fn renders_lifecycle_records() {
        let running = StatusRecord::running(at("2025-10-22 11:43:00.004"));
        assert_eq!(running.render(), "2025-10-22 11:43:00.004@Running");

        let ok = StatusRecord::success(
            at("2025-10-22 11:45:01.532"),
            Duration::from_millis(121_528),
        );
        assert_eq!(ok.render(), "2025-10-22 11:45:01.532@Success#121.528s");

        let failed = StatusRecord::failure(
            at("2025-10-22 11:46:00.017"),
            "retry budget exhausted",
            Some(Duration::from_millis(180_013)),
        );
        assert_eq!(
            failed.render(),
            "2025-10-22 11:46:00.017@Failure#retry budget exhausted#180.013s"
        );
    }

    #[test]
    fn parse_inverts_render() {
        for raw in [
            "2025-10-22 11:43:00.004@Running",
            "2025-10-22 11:45:01.532@Success#121.528s",
            "2025-10-22 11:46:00.017@Failure#attempt cap reached#3.000s",
            "2025-10-22 11:46:00.017@Failure#invalid schedule",
        ] {
            let record = StatusRecord::parse(raw, default_offset()).unwrap();
            assert_eq!(record.render(), raw);
        }
    }

    #[test]
    fn failure_summary_is_sanitised() {
        let record = StatusRecord::failure(
            at("2025-10-22 11:46:00.000"),
            "driver setup failed: #UserName\nnot visible @ 10s",
            None,
        );
        assert_eq!(
            record.phase,
            Phase::Failure("driver setup failed: UserName not visible 10s".into())
        );
        let back = StatusRecord::parse(&record.render(), default_offset()).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn empty_summary_becomes_unknown() {
        assert_eq!(Phase::failure("  # "), Phase::Failure("unknown".into()));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            StatusRecord::parse("no separator", default_offset()),
            Err(StatusParseError::MissingSeparator)
        );
        assert!(matches!(
            StatusRecord::parse("2025-10-22 11:46:00.000@Paused", default_offset()),
            Err(StatusParseError::Phase(_))
        ));
        assert!(matches!(
            StatusRecord::parse("yesterday@Running", default_offset()),
            Err(StatusParseError::Timestamp(_))
        ));
        for elapsed in ["1e30s", "-1.000s", "NaNs", "12"] {
            let raw = format!("2025-10-22 11:45:01.532@Success#{elapsed}");
            assert!(
                matches!(
                    StatusRecord::parse(&raw, default_offset()),
                    Err(StatusParseError::Elapsed(_))
                ),
                "{raw}"
            );
        }
    }
}
