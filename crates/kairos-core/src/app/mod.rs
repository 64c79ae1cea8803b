//! App - アプリケーション層
//!
//! ports を組み合わせて 1 タスクの実行を組み立てる。
//!
//! # 主要コンポーネント
//! - **Scheduler**: 絶対時刻までの待機と schedule の検証
//! - **RetryEngine**: probe → classify → reset / backoff のループ
//! - **TaskOrchestrator**: validate → setup → retry → commit → teardown → status
//! - **OrchestratorBuilder**: capability のワイヤリング

pub mod builder;
pub mod orchestrator;
pub mod retry_engine;
pub mod scheduler;

pub use self::builder::{BuildError, OrchestratorBuilder};
pub use self::orchestrator::TaskOrchestrator;
pub use self::retry_engine::{EngineReport, RetryEngine, RetryPolicy};
pub use self::scheduler::Scheduler;
