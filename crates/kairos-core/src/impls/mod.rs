//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **FileStatusStore**: `<dir>/<task_id>.status`（rename による置き換え）
//! - **InMemoryStatusStore**: テスト用、書き込み履歴つき
//! - **BufferedFileLogger**: 日付ごとのログファイルへ flush 時に追記
//! - **MemoryLogger**: テスト用
//! - **ScriptedDriver**: 台本どおりに結果を返すリハーサル用 driver
//!
//! 実サイト向けの ActionDriver はこのクレートには含めない。

pub mod file_logger;
pub mod file_status;
pub mod inmem_logger;
pub mod inmem_status;
pub mod scripted_driver;

pub use self::file_logger::BufferedFileLogger;
pub use self::file_status::FileStatusStore;
pub use self::inmem_logger::MemoryLogger;
pub use self::inmem_status::InMemoryStatusStore;
pub use self::scripted_driver::{CallCounts, DriverCall, ScriptedDriver};
