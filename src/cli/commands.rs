//! CLI command definitions

use crate::core::EventKind;
use clap::Args;

/// Run a workflow
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to workflow YAML file
    #[arg(short, long)]
    pub file: String,

    /// Branch the run targets
    #[arg(short, long, default_value = "main")]
    pub branch: String,

    /// Repository identity, e.g. org/name
    #[arg(short, long)]
    pub repository: Option<String>,

    /// Event that triggered the run
    #[arg(short, long, value_enum, default_value_t = EventArg::Push)]
    pub event: EventArg,
}

/// Validate a workflow configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to workflow YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Trigger event argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EventArg {
    Push,
    Schedule,
}

impl From<EventArg> for EventKind {
    fn from(arg: EventArg) -> Self {
        match arg {
            EventArg::Push => EventKind::Push,
            EventArg::Schedule => EventKind::Schedule,
        }
    }
}
