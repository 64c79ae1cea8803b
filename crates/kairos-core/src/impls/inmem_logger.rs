//! MemoryLogger - テスト用。記録した行と flush 回数を保持するだけ。

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ports::Logger;

#[derive(Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<String>>,
    flushes: AtomicUsize,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl Logger for MemoryLogger {
    fn record(&self, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
    }

    fn flush(&self) {
        self.flushes.fetch_add(1, Ordering::SeqCst);
    }
}
