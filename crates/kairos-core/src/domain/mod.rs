//! Domain model (config, outcomes, decisions, states, status records, ...).
//!
//! 副作用を持たない型と純粋関数だけを置く。時刻・I/O・driver は ports 側。

pub mod attempt;
pub mod civil;
pub mod config;
pub mod decision;
pub mod errors;
pub mod ids;
pub mod outcome;
pub mod result;
pub mod state;
pub mod status;

pub use attempt::AttemptRecord;
pub use config::{ConfigError, TaskConfig, TaskConfigDocument, recover_task_id, recover_utc_offset};
pub use decision::{Decision, classify};
pub use errors::{DriverError, InvalidSchedule, TaskError};
pub use ids::{InvalidTaskId, RunId, TaskId};
pub use outcome::{AttemptOutcome, OutcomeKind, UnknownOutcome};
pub use result::TaskResult;
pub use state::{EngineState, TerminationReason};
pub use status::{Phase, StatusParseError, StatusRecord};
