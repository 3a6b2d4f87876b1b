//! Dependency scheduler - decides which jobs may run next

use crate::core::Workflow;
use std::collections::HashMap;

/// Lifecycle phase of a job within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    /// Waiting on dependencies
    Pending,
    /// Instances are executing
    Running,
    /// Every instance succeeded
    Succeeded,
    /// At least one instance failed
    Failed,
    /// Never ran
    Skipped,
}

impl JobPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Succeeded | JobPhase::Failed | JobPhase::Skipped)
    }
}

/// Tracks job phases and answers readiness queries over the `needs` graph.
///
/// A job is ready once every dependency succeeded, and blocked once any
/// dependency reached a terminal state other than succeeded. Skips
/// propagate the same way failures do.
pub struct DependencyScheduler {
    jobs: Vec<(String, Vec<String>)>,
    phases: HashMap<String, JobPhase>,
}

impl DependencyScheduler {
    pub fn new(workflow: &Workflow) -> Self {
        let jobs: Vec<(String, Vec<String>)> = workflow
            .jobs()
            .iter()
            .map(|job| (job.id.clone(), job.needs.clone()))
            .collect();
        let phases = jobs
            .iter()
            .map(|(id, _)| (id.clone(), JobPhase::Pending))
            .collect();

        Self { jobs, phases }
    }

    pub fn phase(&self, job_id: &str) -> Option<JobPhase> {
        self.phases.get(job_id).copied()
    }

    pub fn mark(&mut self, job_id: &str, phase: JobPhase) {
        if let Some(entry) = self.phases.get_mut(job_id) {
            *entry = phase;
        }
    }

    /// Pending jobs whose dependencies all succeeded, in declaration order
    pub fn ready(&self) -> Vec<String> {
        self.jobs
            .iter()
            .filter(|(id, needs)| {
                self.phase(id) == Some(JobPhase::Pending)
                    && needs
                        .iter()
                        .all(|dep| self.phase(dep) == Some(JobPhase::Succeeded))
            })
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Pending jobs with a dependency that failed or was skipped, paired
    /// with the first such dependency
    pub fn blocked(&self) -> Vec<(String, String)> {
        self.jobs
            .iter()
            .filter(|(id, _)| self.phase(id) == Some(JobPhase::Pending))
            .filter_map(|(id, needs)| {
                needs
                    .iter()
                    .find(|dep| {
                        matches!(
                            self.phase(dep),
                            Some(JobPhase::Failed) | Some(JobPhase::Skipped)
                        )
                    })
                    .map(|dep| (id.clone(), dep.clone()))
            })
            .collect()
    }

    pub fn all_terminal(&self) -> bool {
        self.phases.values().all(|phase| phase.is_terminal())
    }
}
