// src/check/mod.rs
mod aggregator;
mod error;
mod outcome;
mod resolver;
mod runner;

pub use aggregator::ResultAggregator;
pub use error::CheckError;
pub use outcome::{compose_message, ExecutionOutcome, TIMEOUT_MESSAGE};
pub use resolver::{normalize_name, GroupMember, ScriptGroup, Target, TargetResolver};
pub use runner::{ProcessRunner, Runner, DEFAULT_TIMEOUT};
