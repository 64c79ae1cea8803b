//! kairos - waits for a civil instant, then races for a contested resource.
//!
//! The real automation surface is not part of this binary; the bundled
//! `ScriptedDriver` replays `--script` so a schedule can be rehearsed end to end.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::FixedOffset;
use clap::Parser;
use kairos_core::app::TaskOrchestrator;
use kairos_core::domain::civil::format_timestamp;
use kairos_core::domain::{StatusRecord, TaskConfig, TaskId, recover_task_id, recover_utc_offset};
use kairos_core::impls::{BufferedFileLogger, FileStatusStore, ScriptedDriver};
use kairos_core::ports::{Clock, Logger, StatusStore, SystemClock};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "kairos", version, about)]
struct Cli {
    /// Path to the JSON task configuration.
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Production mode: only warnings and errors reach the console.
    #[arg(long)]
    production: bool,

    /// Directory holding one `<task_id>.status` file per task.
    #[arg(long, default_value = "status")]
    status_dir: PathBuf,

    /// Directory for the dated timeline logs.
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Outcomes replayed by the rehearsal driver, comma separated
    /// (acquired|contested|transient|fatal). The last one repeats.
    #[arg(long, default_value = "acquired")]
    script: String,

    /// Simulated latency of each probe, in milliseconds.
    #[arg(long, default_value_t = 0)]
    probe_latency_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise production mode keeps the console quiet.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if cli.production {
                "warn"
            } else {
                "kairos=info,kairos_core=info,kairos_cli=info"
            })
        }))
        .init();

    let code = run(&cli).await?;
    std::process::exit(code);
}

async fn run(cli: &Cli) -> anyhow::Result<i32> {
    let started = Instant::now();
    let raw = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("failed to read config {}", cli.config.display()))?;

    let config = match TaskConfig::from_json_str(&raw) {
        Ok(config) => config,
        Err(e) => {
            error!(path = %cli.config.display(), error = %e, "invalid task config");
            if let Some(task_id) = recover_task_id(&raw) {
                let failure = StartupFailure {
                    task_id: &task_id,
                    offset: recover_utc_offset(&raw),
                    summary: format!("config error: {e}"),
                };
                failure.record(cli, started).await;
            }
            return Ok(1);
        }
    };

    let driver = match ScriptedDriver::from_script(&cli.script) {
        Ok(driver) => driver.with_probe_latency(Duration::from_millis(cli.probe_latency_ms)),
        Err(e) => {
            error!(script = %cli.script, error = %e, "invalid --script");
            let failure = StartupFailure {
                task_id: &config.task_id,
                offset: *config.target_instant.offset(),
                summary: format!("invalid script: {e}"),
            };
            failure.record(cli, started).await;
            return Ok(1);
        }
    };

    execute(cli, &config, driver).await
}

async fn execute(cli: &Cli, config: &TaskConfig, driver: ScriptedDriver) -> anyhow::Result<i32> {
    let offset = *config.target_instant.offset();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(offset));

    let orchestrator = TaskOrchestrator::builder()
        .clock(clock.clone())
        .status_store(Arc::new(FileStatusStore::new(&cli.status_dir, offset)))
        .logger(Arc::new(BufferedFileLogger::new(
            &cli.log_dir,
            config.task_id.as_str(),
            clock,
        )))
        .driver(Arc::new(driver))
        .build()?;

    info!(
        task_id = %config.task_id,
        target = %format_timestamp(&config.target_instant),
        confirm_final_step = config.confirm_final_step,
        "task loaded"
    );

    let result = orchestrator.run(config).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(result.exit_code())
}

/// A task that ended before the orchestrator could run it.
struct StartupFailure<'a> {
    task_id: &'a TaskId,
    offset: FixedOffset,
    summary: String,
}

impl StartupFailure<'_> {
    /// Logs the failure and elapsed time, then writes the terminal status.
    async fn record(&self, cli: &Cli, started: Instant) {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(self.offset));
        let logger = BufferedFileLogger::new(&cli.log_dir, self.task_id.as_str(), clock.clone());
        logger.record(&self.summary);

        let elapsed = started.elapsed();
        let store = FileStatusStore::new(&cli.status_dir, self.offset);
        let record = StatusRecord::failure(clock.now(), &self.summary, Some(elapsed));
        if let Err(e) = store.write(self.task_id, &record).await {
            logger.record(&format!("status write failed: {e}"));
        }

        let secs = elapsed.as_secs_f64();
        logger.record(&format!(
            "total execution time: {secs:.3} s ({:.2} min)",
            secs / 60.0
        ));
        logger.flush();
    }
}
