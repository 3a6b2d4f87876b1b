//! minici - a minimal job-DAG CI workflow runner

pub mod actions;
pub mod badge;
pub mod cli;
pub mod core;
pub mod execution;
pub mod report;

// Re-export commonly used types
pub use actions::{ActionError, ActionOutcome, ActionRequest, ActionRunner, CommandRunner};
pub use badge::{BadgePublisher, BadgeRequest, GistBadgeClient, PublishError};
pub use core::{
    ConfigError, EventKind, RunContext, RunReport, RunResult, RunStatus, SkipReason, Workflow,
    WorkflowConfig,
};
pub use execution::{ExecutionEngine, ExecutionEvent};
pub use report::{Band, Coverage, ExtractError};
