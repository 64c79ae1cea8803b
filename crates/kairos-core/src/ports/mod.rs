//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部（時計、対象サイト、status ファイル、ログファイル）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! Orchestrator はこれらを引数として受け取り、プロセス全体で共有される
//! 可変状態を持ちません。

pub mod action_driver;
pub mod clock;
pub mod id_generator;
pub mod logger;
pub mod status_store;

pub use self::action_driver::ActionDriver;
pub use self::clock::{AnchoredClock, Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::logger::Logger;
pub use self::status_store::{StatusStore, StatusStoreError};
