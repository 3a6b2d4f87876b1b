//! Main execution engine - orchestrates a whole workflow run

use crate::{
    actions::ActionRunner,
    badge::BadgePublisher,
    core::{
        state::InstanceRecord, RunContext, RunReport, RunResult, RunStatus, SkipReason, Workflow,
    },
    execution::{
        executor::InstanceExecutor,
        scheduler::{DependencyScheduler, JobPhase},
    },
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info};
use uuid::Uuid;

/// Events emitted while a run executes
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        workflow: String,
    },
    JobSkipped {
        job: String,
        reason: SkipReason,
    },
    InstanceStarted {
        instance: String,
    },
    StepStarted {
        instance: String,
        step: String,
    },
    StepCompleted {
        instance: String,
        step: String,
    },
    StepFailed {
        instance: String,
        step: String,
        error: String,
        fatal: bool,
    },
    StepSkipped {
        instance: String,
        step: String,
    },
    BadgePublished {
        instance: String,
        filename: String,
        message: String,
    },
    InstanceFinished {
        instance: String,
        result: RunResult,
    },
    RunCompleted {
        run_id: Uuid,
        status: RunStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Fan-out of execution events to registered handlers
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Arc<Vec<EventHandler>>,
}

impl EventBus {
    pub fn new(handlers: Vec<EventHandler>) -> Self {
        Self {
            handlers: Arc::new(handlers),
        }
    }

    pub fn emit(&self, event: ExecutionEvent) {
        for handler in self.handlers.iter() {
            handler(event.clone());
        }
    }
}

/// Workflow execution engine.
///
/// Expands jobs into instances, runs independent instances concurrently
/// and produces the final [`RunReport`]. Dependency and skip semantics
/// live in the scheduler; per-instance step semantics in the executor.
pub struct ExecutionEngine<R, P> {
    executor: Arc<InstanceExecutor<R, P>>,
    handlers: Vec<EventHandler>,
}

impl<R, P> ExecutionEngine<R, P>
where
    R: ActionRunner + 'static,
    P: BadgePublisher + 'static,
{
    pub fn new(runner: R, publisher: P) -> Self {
        Self {
            executor: Arc::new(InstanceExecutor::new(runner, publisher)),
            handlers: Vec::new(),
        }
    }

    /// Add an event handler. Handlers run synchronously on emit.
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.handlers.push(Arc::new(handler));
    }

    /// Execute the whole workflow and return the run report
    pub async fn execute(&self, workflow: &Workflow, run: &RunContext) -> RunReport {
        let bus = EventBus::new(self.handlers.clone());
        let mut report = RunReport::new();
        report.status = RunStatus::Running;

        info!(
            "Starting workflow run: {} ({})",
            workflow.name, report.run_id
        );
        bus.emit(ExecutionEvent::RunStarted {
            run_id: report.run_id,
            workflow: workflow.name.clone(),
        });

        let mut scheduler = DependencyScheduler::new(workflow);
        let mut join_set: JoinSet<(String, InstanceRecord)> = JoinSet::new();
        let mut remaining: HashMap<String, usize> = HashMap::new();
        let mut failed_jobs: HashSet<String> = HashSet::new();

        loop {
            // Settle skips and launches until no further scheduling progress
            // is possible without an instance finishing.
            let mut progressed = true;
            while progressed {
                progressed = false;

                for (job_id, upstream) in scheduler.blocked() {
                    progressed = true;
                    scheduler.mark(&job_id, JobPhase::Skipped);
                    self.skip_job(
                        workflow,
                        &job_id,
                        SkipReason::Upstream {
                            job: upstream.clone(),
                        },
                        &mut report,
                        &bus,
                    );
                }

                for job_id in scheduler.ready() {
                    progressed = true;
                    let Some(job) = workflow.job(&job_id) else {
                        continue;
                    };

                    let triggered = job
                        .predicate
                        .as_ref()
                        .map_or(true, |p| p.evaluate(|field| run.lookup(field)));
                    if !triggered {
                        scheduler.mark(&job_id, JobPhase::Skipped);
                        self.skip_job(
                            workflow,
                            &job_id,
                            SkipReason::PredicateFalse,
                            &mut report,
                            &bus,
                        );
                        continue;
                    }

                    scheduler.mark(&job_id, JobPhase::Running);
                    let instances = job.expand();
                    remaining.insert(job_id.clone(), instances.len());

                    for instance in instances {
                        let executor = Arc::clone(&self.executor);
                        let job = job.clone();
                        let run = run.clone();
                        let bus = bus.clone();
                        join_set.spawn(async move {
                            bus.emit(ExecutionEvent::InstanceStarted {
                                instance: instance.key.clone(),
                            });
                            let result = executor.execute(&job, &instance, &run, &bus).await;
                            (
                                job.id.clone(),
                                InstanceRecord {
                                    job: instance.job_id,
                                    key: instance.key,
                                    values: instance.values,
                                    result,
                                },
                            )
                        });
                    }
                }
            }

            let Some(joined) = join_set.join_next().await else {
                break;
            };

            match joined {
                Ok((job_id, record)) => {
                    let failed = record.result.is_failed();
                    bus.emit(ExecutionEvent::InstanceFinished {
                        instance: record.key.clone(),
                        result: record.result.clone(),
                    });
                    report.record(record);

                    if failed {
                        failed_jobs.insert(job_id.clone());
                    }
                    if let Some(count) = remaining.get_mut(&job_id) {
                        *count -= 1;
                        if *count == 0 {
                            let phase = if failed_jobs.contains(&job_id) {
                                JobPhase::Failed
                            } else {
                                JobPhase::Succeeded
                            };
                            scheduler.mark(&job_id, phase);
                        }
                    }
                }
                Err(join_error) => {
                    // A panicked instance task; the run cannot be trusted
                    error!("Instance task failed: {}", join_error);
                }
            }
        }

        if !scheduler.all_terminal() {
            error!("Run ended with non-terminal jobs; marking run failed");
            report.status = RunStatus::Failed;
            report.finished_at = Some(chrono::Utc::now());
        } else {
            report.finish();
        }

        info!("Run {} finished: {:?}", report.run_id, report.status);
        bus.emit(ExecutionEvent::RunCompleted {
            run_id: report.run_id,
            status: report.status,
        });

        report
    }

    fn skip_job(
        &self,
        workflow: &Workflow,
        job_id: &str,
        reason: SkipReason,
        report: &mut RunReport,
        bus: &EventBus,
    ) {
        info!("Skipping job {}: {:?}", job_id, reason);
        bus.emit(ExecutionEvent::JobSkipped {
            job: job_id.to_string(),
            reason: reason.clone(),
        });

        let Some(job) = workflow.job(job_id) else {
            return;
        };
        for instance in job.expand() {
            report.record(InstanceRecord {
                job: instance.job_id,
                key: instance.key,
                values: instance.values,
                result: RunResult::Skipped {
                    reason: reason.clone(),
                },
            });
        }
    }
}
