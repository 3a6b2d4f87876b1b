//! Workflow execution engine

pub mod engine;
pub mod executor;
pub mod scheduler;

pub use engine::{EventBus, ExecutionEngine, ExecutionEvent};
pub use executor::{InstanceExecutor, StepError};
pub use scheduler::{DependencyScheduler, JobPhase};
