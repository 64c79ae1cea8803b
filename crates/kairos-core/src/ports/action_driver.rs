//! ActionDriver port - 対象サイトとの具体的なやり取り
//!
//! ページを開く・ログインする・要素をクリックする等はすべて driver の責務。
//! core は driver を「1 回の probe ごとに分類済みの結果を返すもの」として扱う。
//!
//! # 契約
//! - すべてのメソッドは driver 自身のタイムアウトで有界であること
//!   （core は driver の呼び出しを中断しない）
//! - 「空きなし」の判定は driver が画面上の状態（ステータス色など）から行う

use async_trait::async_trait;

use crate::domain::{AttemptOutcome, DriverError};

#[async_trait]
pub trait ActionDriver: Send + Sync {
    /// Establishes session/context up to just before the contested step.
    async fn setup(&self) -> Result<(), DriverError>;

    /// One probe-and-attempt cycle: wait for the element, read the
    /// availability signal, then either commit the attempt or report.
    async fn probe(&self) -> AttemptOutcome;

    /// Resets the view to a consistent baseline and re-arms the next cycle.
    async fn reset_view(&self) -> Result<(), DriverError>;

    /// The irreversible final step.
    async fn commit_final(&self) -> Result<(), DriverError>;

    /// Releases the surface. Best-effort: failures are logged and ignored.
    async fn teardown(&self) -> Result<(), DriverError>;
}
