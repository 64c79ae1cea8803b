//! kairos-core
//!
//! Core building blocks for time-critical, contested single-shot acquisitions:
//! wait for an absolute civil instant, then race for a resource that other
//! parties are competing for, and report the outcome through a status record.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（config, ids, outcome, decision, state, status, result, errors）
//! - **ports**: 抽象化レイヤー（Clock, ActionDriver, StatusStore, Logger, IdGenerator）
//! - **app**: アプリケーションロジック（Scheduler, RetryEngine, TaskOrchestrator, builder）
//! - **impls**: 実装（ファイル / メモリの status store、logger、ScriptedDriver）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
