//! Core domain models for MiniCI
//!
//! This module defines the fundamental data structures that represent
//! workflows, jobs, steps, and the contexts they run against.

pub mod config;
pub mod context;
pub mod job;
pub mod matrix;
pub mod predicate;
pub mod state;
pub mod workflow;

pub use config::{ConfigError, WorkflowConfig};
pub use context::{EventKind, InstanceContext, RunContext};
pub use job::{Job, JobInstance, Step, StepAction};
pub use matrix::Matrix;
pub use predicate::Predicate;
pub use state::{InstanceRecord, RunReport, RunResult, RunStatus, SkipReason};
pub use workflow::Workflow;
