//! BufferedFileLogger - 実行中はメモリに溜め、終了時に日付ファイルへ追記
//!
//! 1 行の形式: `[2025-10-22 11:45:00.312] [<profile>] <message>`
//! 追記先: `<log_dir>/YYYYMMDD.log`（civil date）
//!
//! タイミングが重要な区間でファイル I/O をしないよう、書き出しは flush 時のみ。
//! 各行は tracing にも流す（コンソール表示は subscriber 次第）。

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::domain::civil::{format_timestamp, log_file_name};
use crate::ports::{Clock, Logger};

pub struct BufferedFileLogger {
    log_dir: PathBuf,
    profile: String,
    clock: Arc<dyn Clock>,
    buffer: Mutex<String>,
}

impl BufferedFileLogger {
    pub fn new(
        log_dir: impl Into<PathBuf>,
        profile: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            log_dir: log_dir.into(),
            profile: profile.into(),
            clock,
            buffer: Mutex::new(String::new()),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Path the next flush appends to.
    pub fn current_log_path(&self) -> PathBuf {
        self.log_dir.join(log_file_name(&self.clock.now()))
    }

    /// Unflushed content.
    pub fn pending(&self) -> String {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn append(&self, path: &Path, content: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.log_dir)?;
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(content.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()
    }
}

impl Logger for BufferedFileLogger {
    fn record(&self, message: &str) {
        tracing::info!(target: "kairos::timeline", profile = %self.profile, "{message}");
        let line = format!(
            "[{}] [{}] {}\n",
            format_timestamp(&self.clock.now()),
            self.profile,
            message
        );
        self.buffer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_str(&line);
    }

    fn flush(&self) {
        let path = self.current_log_path();
        let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        match self.append(&path, &buffer) {
            Ok(()) => buffer.clear(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to write log file");
                // kept in the buffer so the next successful flush carries it
                buffer.push_str(&format!("log flush failed: {e}\n"));
            }
        }
    }
}
