//! Check execution engine
//!
//! `orchestrator` runs the roster strictly in sequence and `result` holds
//! the per-run state it writes to.

pub mod orchestrator;
pub mod result;

pub use orchestrator::ParityOrchestrator;
pub use result::{CheckResult, CheckStatus, RunState, RunSummary};
