//! ScriptedDriver - 台本どおりの結果を返す ActionDriver
//!
//! 実サイトを使わずに scheduler / retry engine / orchestrator を動かすための
//! リハーサル用 driver。テストのスタブも兼ねる。
//!
//! - probe は台本を先頭から順に返し、尽きたら最後の結果を繰り返す
//! - probe ごとに固定のレイテンシを入れられる（tokio::time::sleep）
//! - setup / reset / commit / teardown を失敗させられる
//! - すべての呼び出しを順番付きで記録する

use std::str::FromStr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{AttemptOutcome, DriverError, OutcomeKind, UnknownOutcome};
use crate::ports::ActionDriver;

/// Driver operations, as recorded in the call journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverCall {
    Setup,
    Probe,
    ResetView,
    CommitFinal,
    Teardown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub setup: usize,
    pub probe: usize,
    pub reset_view: usize,
    pub commit_final: usize,
    pub teardown: usize,
}

pub struct ScriptedDriver {
    script: Vec<AttemptOutcome>,
    cursor: AtomicUsize,
    probe_latency: Duration,
    setup_error: Option<DriverError>,
    reset_error: Option<DriverError>,
    commit_error: Option<DriverError>,
    teardown_error: Option<DriverError>,
    journal: Mutex<Vec<DriverCall>>,
}

impl ScriptedDriver {
    /// An empty script behaves like `[Acquired]`.
    pub fn new(script: Vec<AttemptOutcome>) -> Self {
        let script = if script.is_empty() {
            vec![AttemptOutcome::Acquired]
        } else {
            script
        };
        Self {
            script,
            cursor: AtomicUsize::new(0),
            probe_latency: Duration::ZERO,
            setup_error: None,
            reset_error: None,
            commit_error: None,
            teardown_error: None,
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Parses `acquired|contested|transient|fatal`, comma separated.
    pub fn from_script(script: &str) -> Result<Self, UnknownOutcome> {
        let outcomes = script
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| OutcomeKind::from_str(s).map(scripted_outcome))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(outcomes))
    }

    pub fn with_probe_latency(mut self, latency: Duration) -> Self {
        self.probe_latency = latency;
        self
    }

    pub fn failing_setup(mut self, error: DriverError) -> Self {
        self.setup_error = Some(error);
        self
    }

    pub fn failing_reset(mut self, error: DriverError) -> Self {
        self.reset_error = Some(error);
        self
    }

    pub fn failing_commit(mut self, error: DriverError) -> Self {
        self.commit_error = Some(error);
        self
    }

    pub fn failing_teardown(mut self, error: DriverError) -> Self {
        self.teardown_error = Some(error);
        self
    }

    pub fn journal(&self) -> Vec<DriverCall> {
        self.journal.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn calls(&self) -> CallCounts {
        let mut counts = CallCounts::default();
        for call in self.journal() {
            match call {
                DriverCall::Setup => counts.setup += 1,
                DriverCall::Probe => counts.probe += 1,
                DriverCall::ResetView => counts.reset_view += 1,
                DriverCall::CommitFinal => counts.commit_final += 1,
                DriverCall::Teardown => counts.teardown += 1,
            }
        }
        counts
    }

    fn note(&self, call: DriverCall) {
        self.journal
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    fn result_of(error: &Option<DriverError>) -> Result<(), DriverError> {
        match error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

fn scripted_outcome(kind: OutcomeKind) -> AttemptOutcome {
    match kind {
        OutcomeKind::Acquired => AttemptOutcome::Acquired,
        OutcomeKind::Contested => AttemptOutcome::Contested,
        OutcomeKind::Transient => AttemptOutcome::TransientFailure("scripted timeout".into()),
        OutcomeKind::Fatal => AttemptOutcome::FatalFailure("scripted failure".into()),
    }
}

#[async_trait]
impl ActionDriver for ScriptedDriver {
    async fn setup(&self) -> Result<(), DriverError> {
        self.note(DriverCall::Setup);
        Self::result_of(&self.setup_error)
    }

    async fn probe(&self) -> AttemptOutcome {
        self.note(DriverCall::Probe);
        if !self.probe_latency.is_zero() {
            tokio::time::sleep(self.probe_latency).await;
        }
        let i = self.cursor.fetch_add(1, Ordering::SeqCst);
        let last = self.script.len() - 1;
        self.script[i.min(last)].clone()
    }

    async fn reset_view(&self) -> Result<(), DriverError> {
        self.note(DriverCall::ResetView);
        Self::result_of(&self.reset_error)
    }

    async fn commit_final(&self) -> Result<(), DriverError> {
        self.note(DriverCall::CommitFinal);
        Self::result_of(&self.commit_error)
    }

    async fn teardown(&self) -> Result<(), DriverError> {
        self.note(DriverCall::Teardown);
        Self::result_of(&self.teardown_error)
    }
}
