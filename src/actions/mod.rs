//! Opaque step actions and the seam to the outside world
//!
//! The executor never runs commands itself; it goes through the
//! [`ActionRunner`] trait so tests can substitute a scripted runner.

pub mod command;

pub use command::CommandRunner;

use async_trait::async_trait;
use thiserror::Error;

/// A request to run one step's external command
#[derive(Debug, Clone)]
pub struct ActionRequest {
    /// Step name, for logging
    pub step: String,

    /// Fully interpolated command line
    pub command: String,
}

/// Outcome of a completed command
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// Whether the command exited with status zero
    pub success: bool,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,
}

/// Errors from the action runner itself, distinct from a command that ran
/// and failed
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("failed to spawn command: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Executes step commands. Implementations decide how and where.
#[async_trait]
pub trait ActionRunner: Send + Sync {
    async fn run(&self, request: &ActionRequest) -> Result<ActionOutcome, ActionError>;
}
