//! Logger port - 人が読むタイムラインログ
//!
//! `record` も `flush` も呼び出し側を失敗させない。書き込みに失敗した場合は
//! 実装側でバッファに記録し、次回の flush で残す。

use std::sync::Arc;

pub trait Logger: Send + Sync {
    fn record(&self, message: &str);

    /// Persists everything recorded so far.
    fn flush(&self);
}

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn record(&self, message: &str) {
        (**self).record(message)
    }

    fn flush(&self) {
        (**self).flush()
    }
}
