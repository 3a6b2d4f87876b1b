//! Instance executor - runs one job instance's step sequence

use crate::{
    actions::{ActionRequest, ActionRunner},
    badge::{BadgePublisher, BadgeRequest, PublishError},
    core::{
        context::{ContextError, InstanceContext},
        job::{BadgeSpec, Job, JobInstance, Step, StepAction},
        RunContext, RunResult,
    },
    execution::engine::{EventBus, ExecutionEvent},
    report::{self, ExtractError},
};
use chrono::Utc;
use thiserror::Error;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, warn};

/// A fatal step error. Any of these fails the instance unless the step is
/// marked `continue_on_error`.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("step '{step}' command exited non-zero: {detail}")]
    Command { step: String, detail: String },

    #[error("step '{step}' could not run: {source}")]
    Runner {
        step: String,
        #[source]
        source: crate::actions::ActionError,
    },

    #[error("step '{step}' extracts from '{from}', but nothing was captured under that key")]
    MissingCapture { step: String, from: String },

    #[error("step '{step}' failed to parse the coverage report: {source}")]
    Extraction {
        step: String,
        #[source]
        source: ExtractError,
    },

    #[error("step '{step}' failed to publish the badge: {source}")]
    Publish {
        step: String,
        #[source]
        source: PublishError,
    },

    #[error(transparent)]
    Derived(#[from] ContextError),
}

/// Executes the steps of a single job instance.
///
/// Each instance gets its own [`InstanceContext`]; derived state never
/// crosses instance boundaries. The first fatal step error ends the
/// instance, and the whole step sequence runs under the job's wall-clock
/// timeout.
pub struct InstanceExecutor<R, P> {
    runner: R,
    publisher: P,
}

impl<R: ActionRunner, P: BadgePublisher> InstanceExecutor<R, P> {
    pub fn new(runner: R, publisher: P) -> Self {
        Self { runner, publisher }
    }

    /// Run every step of the instance and return its terminal result
    pub async fn execute(
        &self,
        job: &Job,
        instance: &JobInstance,
        run: &RunContext,
        bus: &EventBus,
    ) -> RunResult {
        info!("Executing instance: {}", instance.key);
        let started_at = Utc::now();

        let mut context = InstanceContext::new(run.clone(), instance.values.clone());
        let budget = Duration::from_secs(job.timeout_minutes * 60);

        match timeout(budget, self.run_steps(job, instance, &mut context, bus)).await {
            Ok(Ok(())) => RunResult::Succeeded {
                started_at,
                finished_at: Utc::now(),
            },
            Ok(Err(e)) => {
                error!("Instance {} failed: {}", instance.key, e);
                RunResult::Failed {
                    error: e.to_string(),
                    started_at,
                    finished_at: Utc::now(),
                }
            }
            Err(_) => {
                error!(
                    "Instance {} timed out after {} minutes",
                    instance.key, job.timeout_minutes
                );
                RunResult::Failed {
                    error: format!("timed out after {} minutes", job.timeout_minutes),
                    started_at,
                    finished_at: Utc::now(),
                }
            }
        }
    }

    async fn run_steps(
        &self,
        job: &Job,
        instance: &JobInstance,
        context: &mut InstanceContext,
        bus: &EventBus,
    ) -> Result<(), StepError> {
        for step in &job.steps {
            if let Some(predicate) = &step.predicate {
                if !predicate.evaluate(|key| context.lookup(key)) {
                    debug!("Step {} gated off for {}", step.name, instance.key);
                    bus.emit(ExecutionEvent::StepSkipped {
                        instance: instance.key.clone(),
                        step: step.name.clone(),
                    });
                    continue;
                }
            }

            bus.emit(ExecutionEvent::StepStarted {
                instance: instance.key.clone(),
                step: step.name.clone(),
            });

            match self.run_step(step, instance, context, bus).await {
                Ok(()) => {
                    bus.emit(ExecutionEvent::StepCompleted {
                        instance: instance.key.clone(),
                        step: step.name.clone(),
                    });
                }
                Err(e) if step.continue_on_error => {
                    warn!(
                        "Step {} failed but continues for {}: {}",
                        step.name, instance.key, e
                    );
                    bus.emit(ExecutionEvent::StepFailed {
                        instance: instance.key.clone(),
                        step: step.name.clone(),
                        error: e.to_string(),
                        fatal: false,
                    });
                }
                Err(e) => {
                    bus.emit(ExecutionEvent::StepFailed {
                        instance: instance.key.clone(),
                        step: step.name.clone(),
                        error: e.to_string(),
                        fatal: true,
                    });
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    async fn run_step(
        &self,
        step: &Step,
        instance: &JobInstance,
        context: &mut InstanceContext,
        bus: &EventBus,
    ) -> Result<(), StepError> {
        match &step.action {
            StepAction::Run { command, capture } => {
                self.run_command(step, command, capture.as_deref(), context)
                    .await
            }
            StepAction::ExtractCoverage { from } => self.extract_coverage(step, from, context),
            StepAction::PublishBadge(spec) => {
                self.publish_badge(step, spec, instance, context, bus).await
            }
        }
    }

    async fn run_command(
        &self,
        step: &Step,
        command: &str,
        capture: Option<&str>,
        context: &mut InstanceContext,
    ) -> Result<(), StepError> {
        let rendered = context.interpolate(command);
        let request = ActionRequest {
            step: step.name.clone(),
            command: rendered,
        };

        let outcome = self
            .runner
            .run(&request)
            .await
            .map_err(|source| StepError::Runner {
                step: step.name.clone(),
                source,
            })?;

        if !outcome.success {
            let detail = outcome.stderr.trim();
            return Err(StepError::Command {
                step: step.name.clone(),
                detail: if detail.is_empty() {
                    "no output".to_string()
                } else {
                    detail.to_string()
                },
            });
        }

        if let Some(key) = capture {
            context.set_derived(key, outcome.stdout)?;
        }

        Ok(())
    }

    fn extract_coverage(
        &self,
        step: &Step,
        from: &str,
        context: &mut InstanceContext,
    ) -> Result<(), StepError> {
        let text = context
            .derived(from)
            .ok_or_else(|| StepError::MissingCapture {
                step: step.name.clone(),
                from: from.to_string(),
            })?;

        let coverage = report::extract(text).map_err(|source| StepError::Extraction {
            step: step.name.clone(),
            source,
        })?;

        context.set_derived(report::COVERAGE_KEY, coverage.message())?;
        context.set_derived(report::COLOR_KEY, coverage.band.as_str())?;

        info!(
            "Extracted coverage {} ({})",
            coverage.message(),
            coverage.band.as_str()
        );
        Ok(())
    }

    async fn publish_badge(
        &self,
        step: &Step,
        spec: &BadgeSpec,
        instance: &JobInstance,
        context: &InstanceContext,
        bus: &EventBus,
    ) -> Result<(), StepError> {
        // Publication requires extracted coverage in this instance's state;
        // without it the step is a no-op, not a failure.
        let (Some(message), Some(color)) = (
            context.derived(report::COVERAGE_KEY),
            context.derived(report::COLOR_KEY),
        ) else {
            warn!(
                "Step {} has no extracted coverage, skipping badge for {}",
                step.name, instance.key
            );
            bus.emit(ExecutionEvent::StepSkipped {
                instance: instance.key.clone(),
                step: step.name.clone(),
            });
            return Ok(());
        };

        let request = BadgeRequest {
            gist_id: spec.gist_id.clone(),
            token_env: spec.token_env.clone(),
            filename: BadgeRequest::filename_for(&spec.project, &context.run().branch),
            label: spec.label.clone(),
            message: message.to_string(),
            color: color.to_string(),
        };

        self.publisher
            .publish(&request)
            .await
            .map_err(|source| StepError::Publish {
                step: step.name.clone(),
                source,
            })?;

        bus.emit(ExecutionEvent::BadgePublished {
            instance: instance.key.clone(),
            filename: request.filename,
            message: request.message,
        });
        Ok(())
    }
}
