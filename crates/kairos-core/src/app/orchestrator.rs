//! TaskOrchestrator - 1 タスクの実行全体を順に進める
//!
//! # フロー
//! 1. target が未来であることを確認（失敗したら driver には触れない）
//! 2. status = Running
//! 3. arm instant まで待って driver.setup()
//! 4. engage instant まで待ち、flying bias 分さらに待つ
//! 5. RetryEngine
//! 6. Acquired かつ confirm_final_step のときだけ driver.commit_final()
//! 7. driver.teardown()（best-effort）
//! 8. status = Success / Failure、ログを flush
//!
//! setup / commit の失敗もタスクを終わらせるだけで、teardown と最終 status の
//! 書き込みは必ず通る。status の書き込み失敗はログに残すだけで結果は変えない。

use std::sync::Arc;

use tokio::time::Instant;
use tracing::Instrument;

use crate::app::retry_engine::{RetryEngine, RetryPolicy};
use crate::app::scheduler::Scheduler;
use crate::domain::civil::format_timestamp;
use crate::domain::{
    EngineState, RunId, StatusRecord, TaskConfig, TaskError, TaskId, TaskResult, TerminationReason,
};
use crate::ports::{ActionDriver, Clock, IdGenerator, Logger, StatusStore, UlidGenerator};

pub struct TaskOrchestrator {
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) status_store: Arc<dyn StatusStore>,
    pub(crate) logger: Arc<dyn Logger>,
    pub(crate) driver: Arc<dyn ActionDriver>,
    pub(crate) ids: UlidGenerator<Arc<dyn Clock>>,
}

impl TaskOrchestrator {
    pub fn builder() -> super::OrchestratorBuilder {
        super::OrchestratorBuilder::new()
    }

    /// Runs one task to completion. Never fails: every outcome is a `TaskResult`.
    pub async fn run(&self, config: &TaskConfig) -> TaskResult {
        let run_id = self.ids.generate_run_id();
        let span = tracing::info_span!("task", task_id = %config.task_id, %run_id);
        self.run_task(config, run_id).instrument(span).await
    }

    async fn run_task(&self, config: &TaskConfig, run_id: RunId) -> TaskResult {
        let started = Instant::now();
        let scheduler = Scheduler::new(self.clock.clone(), config.engage_lead);
        self.log(&format!("program start: task {} ({run_id})", config.task_id));

        if let Err(e) = scheduler.validate(config.target_instant) {
            let err = TaskError::from(e);
            self.log(&err.to_string());
            let result = TaskResult::failed(
                TerminationReason::InvalidSchedule,
                0,
                0.0,
                Some(err.summary()),
            );
            return self.finish(config, result, started).await;
        }

        self.write_status(&config.task_id, StatusRecord::running(self.clock.now()))
            .await;

        let arm = scheduler.compute_arm_instant(config.target_instant, config.lead_offset);
        self.log(&format!("waiting until {} to set up", format_timestamp(&arm)));
        scheduler.suspend_until(arm).await;

        if let Err(e) = self.driver.setup().await {
            let err = TaskError::DriverSetup(e);
            tracing::error!(error = %err, "driver setup failed");
            self.log(&err.to_string());
            self.teardown().await;
            let result =
                TaskResult::failed(TerminationReason::SetupFailed, 0, 0.0, Some(err.summary()));
            return self.finish(config, result, started).await;
        }
        self.log("driver ready");

        let engage = scheduler.compute_engage_instant(config.target_instant);
        self.log(&format!("waiting until {}", format_timestamp(&engage)));
        scheduler.suspend_until(engage).await;
        if !config.flying_bias.is_zero() {
            tokio::time::sleep(config.flying_bias).await;
        }

        self.log("retry loop start");
        let engine = RetryEngine::new(RetryPolicy::from(config));
        let report = engine.run(self.driver.as_ref(), self.logger.as_ref()).await;

        let result = match report.state {
            EngineState::Acquired if config.confirm_final_step => {
                match self.driver.commit_final().await {
                    Ok(()) => {
                        self.log("final step committed");
                        TaskResult::acquired(report.attempts, 0.0)
                    }
                    Err(e) => {
                        let err = TaskError::DriverCommit(e);
                        tracing::error!(error = %err, "final commit failed");
                        self.log(&err.to_string());
                        TaskResult::failed(
                            TerminationReason::CommitFailed,
                            report.attempts,
                            0.0,
                            Some(err.summary()),
                        )
                    }
                }
            }
            EngineState::Acquired => {
                self.log("final step not confirmed, leaving it uncommitted");
                TaskResult::acquired(report.attempts, 0.0)
            }
            EngineState::TimedOut => TaskResult::failed(
                TerminationReason::RetryBudgetExhausted,
                report.attempts,
                0.0,
                None,
            ),
            EngineState::Aborted => TaskResult::failed(
                TerminationReason::AttemptCapReached,
                report.attempts,
                0.0,
                None,
            ),
            EngineState::Idle
            | EngineState::Probing
            | EngineState::Refreshing
            | EngineState::Backoff => {
                tracing::error!(
                    state = ?report.state,
                    "retry loop stopped in a non-terminal state"
                );
                TaskResult::failed(
                    TerminationReason::RetryBudgetExhausted,
                    report.attempts,
                    0.0,
                    Some(format!("retry loop stopped while {:?}", report.state)),
                )
            }
        };

        self.teardown().await;
        self.finish(config, result, started).await
    }

    async fn teardown(&self) {
        if let Err(e) = self.driver.teardown().await {
            tracing::warn!(error = %e, "driver teardown failed");
            self.log(&format!("teardown failed (ignored): {e}"));
        }
    }

    /// Stamps elapsed time, writes the terminal status and flushes the log.
    async fn finish(
        &self,
        config: &TaskConfig,
        mut result: TaskResult,
        started: Instant,
    ) -> TaskResult {
        let elapsed = started.elapsed();
        result.elapsed_seconds = elapsed.as_secs_f64();

        let now = self.clock.now();
        let record = if result.succeeded {
            StatusRecord::success(now, elapsed)
        } else {
            StatusRecord::failure(now, result.failure_summary(), Some(elapsed))
        };
        self.write_status(&config.task_id, record).await;

        if result.succeeded {
            self.log(&format!("program end: acquired after {} attempts", result.attempts));
        } else {
            self.log(&format!("program end: {}", result.failure_summary()));
        }
        let secs = result.elapsed_seconds;
        self.log(&format!(
            "total execution time: {secs:.3} s ({:.2} min)",
            secs / 60.0
        ));
        tracing::info!(
            succeeded = result.succeeded,
            reason = %result.termination_reason,
            attempts = result.attempts,
            elapsed_s = secs,
            "task finished"
        );

        self.logger.flush();
        result
    }

    async fn write_status(&self, task_id: &TaskId, record: StatusRecord) {
        if let Err(e) = self.status_store.write(task_id, &record).await {
            tracing::warn!(error = %e, status = %record, "status write failed");
            self.log(&format!("status write failed: {e}"));
        }
    }

    fn log(&self, message: &str) {
        self.logger.record(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::{DateTime, FixedOffset};

    use crate::domain::civil::{default_offset, parse_target};
    use crate::domain::{AttemptOutcome, DriverError, Phase};
    use crate::impls::{DriverCall, InMemoryStatusStore, MemoryLogger, ScriptedDriver};
    use crate::ports::AnchoredClock;

    fn at(raw: &str) -> DateTime<FixedOffset> {
        parse_target(raw, default_offset()).unwrap()
    }

    struct Harness {
        orchestrator: TaskOrchestrator,
        driver: Arc<ScriptedDriver>,
        status: Arc<InMemoryStatusStore>,
        logger: Arc<MemoryLogger>,
    }

    /// Clock starts at 11:40:00; tasks target 11:45:00.
    fn harness(driver: ScriptedDriver) -> Harness {
        let driver = Arc::new(driver);
        let status = Arc::new(InMemoryStatusStore::new());
        let logger = Arc::new(MemoryLogger::new());
        let orchestrator = TaskOrchestrator::builder()
            .clock(Arc::new(AnchoredClock::new(at("2025-10-22 11:40:00"))))
            .status_store(status.clone())
            .logger(logger.clone())
            .driver(driver.clone())
            .build()
            .unwrap();
        Harness {
            orchestrator,
            driver,
            status,
            logger,
        }
    }

    fn config() -> TaskConfig {
        TaskConfig::new(TaskId::new("krp-15").unwrap(), at("2025-10-22 11:45:00"))
    }

    async fn statuses(h: &Harness) -> Vec<StatusRecord> {
        h.status
            .history(&TaskId::new("krp-15").unwrap())
            .await
            .iter()
            .map(|raw| StatusRecord::parse(raw, default_offset()).unwrap())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn successful_run_goes_running_then_success() {
        let h = harness(ScriptedDriver::from_script("contested,acquired").unwrap());
        let result = h.orchestrator.run(&config()).await;

        assert!(result.succeeded);
        assert_eq!(result.attempts, 2);
        assert_eq!(result.exit_code(), 0);

        let history = h.status.history(&TaskId::new("krp-15").unwrap()).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], "2025-10-22 11:40:00.000@Running");

        let end = &statuses(&h).await[1];
        assert_eq!(end.phase, Phase::Success);
        assert!(end.elapsed.unwrap() >= Duration::from_secs(299));
        assert!(end.at >= at("2025-10-22 11:44:59"));
        assert!(result.elapsed_seconds >= 299.0);
    }

    #[tokio::test(start_paused = true)]
    async fn unconfirmed_run_never_commits() {
        let h = harness(ScriptedDriver::from_script("acquired").unwrap());
        let result = h.orchestrator.run(&config()).await;

        assert!(result.succeeded);
        assert_eq!(h.driver.calls().commit_final, 0);
        assert_eq!(h.driver.calls().teardown, 1);
        assert!(h.logger.contains("final step not confirmed"));
        assert_eq!(h.logger.flush_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn confirmed_run_commits_before_teardown() {
        let h = harness(ScriptedDriver::from_script("acquired").unwrap());
        let result = h
            .orchestrator
            .run(&config().with_confirm_final_step(true))
            .await;

        assert!(result.succeeded);
        assert_eq!(
            h.driver.journal(),
            vec![
                DriverCall::Setup,
                DriverCall::Probe,
                DriverCall::CommitFinal,
                DriverCall::Teardown,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn setup_starts_at_arm_instant() {
        let h = harness(ScriptedDriver::from_script("acquired").unwrap());
        let start = Instant::now();
        h.orchestrator.run(&config()).await;

        // 11:40:00 → arm at 11:43:00 → engage at 11:44:59
        assert!(start.elapsed() >= Duration::from_secs(299));
        assert!(h.logger.contains("waiting until 2025-10-22 11:43:00.000 to set up"));
        assert!(h.logger.contains("waiting until 2025-10-22 11:44:59.000"));
    }

    #[tokio::test(start_paused = true)]
    async fn past_target_fails_before_setup() {
        let h = harness(ScriptedDriver::from_script("acquired").unwrap());
        let config = TaskConfig::new(TaskId::new("krp-15").unwrap(), at("2025-10-22 11:00:00"));
        let result = h.orchestrator.run(&config).await;

        assert!(!result.succeeded);
        assert_eq!(result.termination_reason, TerminationReason::InvalidSchedule);
        assert_eq!(result.attempts, 0);
        assert!(h.driver.journal().is_empty());

        let history = statuses(&h).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].phase, Phase::Failure("invalid schedule".into()));
        assert_eq!(h.logger.flush_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn setup_failure_still_tears_down_and_records() {
        let h = harness(
            ScriptedDriver::from_script("acquired")
                .unwrap()
                .failing_setup(DriverError::Timeout("login form".into())),
        );
        let result = h.orchestrator.run(&config()).await;

        assert_eq!(result.termination_reason, TerminationReason::SetupFailed);
        assert_eq!(result.exit_code(), 1);
        assert_eq!(h.driver.calls().probe, 0);
        assert_eq!(h.driver.calls().teardown, 1);

        let history = statuses(&h).await;
        assert_eq!(
            history.last().unwrap().phase,
            Phase::Failure("driver setup failed: login form".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn commit_failure_is_reported() {
        let h = harness(
            ScriptedDriver::from_script("acquired")
                .unwrap()
                .failing_commit(DriverError::Unexpected("button gone".into())),
        );
        let result = h
            .orchestrator
            .run(&config().with_confirm_final_step(true))
            .await;

        assert!(!result.succeeded);
        assert_eq!(result.termination_reason, TerminationReason::CommitFailed);
        assert_eq!(result.attempts, 1);
        assert_eq!(h.driver.calls().teardown, 1);
        assert_eq!(
            statuses(&h).await.last().unwrap().phase,
            Phase::Failure("final commit failed: button gone".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_fails_with_reason() {
        let h = harness(
            ScriptedDriver::new(vec![AttemptOutcome::Contested])
                .with_probe_latency(Duration::from_millis(100)),
        );
        let config = config().with_retry_budget(Duration::from_secs(1));
        let result = h.orchestrator.run(&config).await;

        assert_eq!(
            result.termination_reason,
            TerminationReason::RetryBudgetExhausted
        );
        assert!(result.attempts >= 9);
        assert_eq!(
            statuses(&h).await.last().unwrap().phase,
            Phase::Failure("retry budget exhausted".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_status_store_does_not_change_result() {
        let h = harness(ScriptedDriver::from_script("acquired").unwrap());
        h.status.set_unreachable(true);
        let result = h.orchestrator.run(&config()).await;

        assert!(result.succeeded);
        assert!(h.logger.contains("status write failed"));
        assert_eq!(h.logger.flush_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_failure_is_ignored() {
        let h = harness(
            ScriptedDriver::from_script("acquired")
                .unwrap()
                .failing_teardown(DriverError::Unexpected("browser gone".into())),
        );
        let result = h.orchestrator.run(&config()).await;

        assert!(result.succeeded);
        assert!(h.logger.contains("teardown failed (ignored)"));
    }

    #[tokio::test(start_paused = true)]
    async fn logs_total_execution_time() {
        let h = harness(ScriptedDriver::from_script("acquired").unwrap());
        h.orchestrator.run(&config()).await;

        let lines = h.logger.lines();
        assert!(lines[0].starts_with("program start: task krp-15 (run-"));
        assert!(lines.iter().any(|l| l == "program end: acquired after 1 attempts"));
        assert!(lines.last().unwrap().starts_with("total execution time: "));
        assert!(lines.last().unwrap().ends_with(" min)"));
    }

    /// Records when each driver call happens, on tokio's clock.
    struct StopwatchDriver {
        inner: ScriptedDriver,
        started: Instant,
        calls: std::sync::Mutex<Vec<(DriverCall, Duration)>>,
    }

    impl StopwatchDriver {
        fn new(inner: ScriptedDriver) -> Self {
            Self {
                inner,
                started: Instant::now(),
                calls: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn first(&self, call: DriverCall) -> Duration {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .find(|(c, _)| *c == call)
                .map(|(_, at)| *at)
                .unwrap()
        }

        fn note(&self, call: DriverCall) {
            self.calls.lock().unwrap().push((call, self.started.elapsed()));
        }
    }

    #[async_trait::async_trait]
    impl ActionDriver for StopwatchDriver {
        async fn setup(&self) -> Result<(), DriverError> {
            self.note(DriverCall::Setup);
            self.inner.setup().await
        }

        async fn probe(&self) -> AttemptOutcome {
            self.note(DriverCall::Probe);
            self.inner.probe().await
        }

        async fn reset_view(&self) -> Result<(), DriverError> {
            self.note(DriverCall::ResetView);
            self.inner.reset_view().await
        }

        async fn commit_final(&self) -> Result<(), DriverError> {
            self.note(DriverCall::CommitFinal);
            self.inner.commit_final().await
        }

        async fn teardown(&self) -> Result<(), DriverError> {
            self.note(DriverCall::Teardown);
            self.inner.teardown().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn leads_and_flying_bias_move_setup_and_first_attempt() {
        let driver = Arc::new(StopwatchDriver::new(
            ScriptedDriver::from_script("acquired").unwrap(),
        ));
        let orchestrator = TaskOrchestrator::builder()
            .clock(Arc::new(AnchoredClock::new(at("2025-10-22 11:40:00"))))
            .status_store(Arc::new(InMemoryStatusStore::new()))
            .logger(Arc::new(MemoryLogger::new()))
            .driver(driver.clone())
            .build()
            .unwrap();

        // arm at 11:44:00, engage at 11:44:59.500, first probe 250ms later
        let config = config()
            .with_lead_offset(Duration::from_secs(60))
            .with_engage_lead(Duration::from_millis(500))
            .with_flying_bias(Duration::from_millis(250));
        let result = orchestrator.run(&config).await;
        assert!(result.succeeded);

        let setup = driver.first(DriverCall::Setup);
        assert!(setup >= Duration::from_secs(240), "{setup:?}");
        assert!(setup <= Duration::from_millis(240_010), "{setup:?}");

        let probe = driver.first(DriverCall::Probe);
        assert!(probe >= Duration::from_millis(299_750), "{probe:?}");
        assert!(probe <= Duration::from_millis(299_760), "{probe:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_cap_fails_with_reason() {
        let h = harness(ScriptedDriver::from_script("transient").unwrap());
        let config = config()
            .with_max_attempts(3)
            .with_backoff(Duration::from_millis(200));
        let start = Instant::now();
        let result = h.orchestrator.run(&config).await;

        assert_eq!(result.termination_reason, TerminationReason::AttemptCapReached);
        assert_eq!(result.attempts, 3);
        assert_eq!(h.driver.calls().probe, 3);
        // 11:40:00 → 11:44:59 plus three backoffs
        assert!(start.elapsed() >= Duration::from_millis(299_600));
        assert_eq!(
            statuses(&h).await.last().unwrap().phase,
            Phase::Failure("attempt cap reached".into())
        );
    }
}
