//! Workflow domain model

use crate::core::{
    config::WorkflowConfig,
    job::{Job, JobDefaults},
};
use std::collections::{HashMap, HashSet};

/// A workflow definition: named jobs wired by `needs` edges.
///
/// Jobs keep their declaration order; the dependency graph is guaranteed
/// acyclic by config validation.
#[derive(Debug, Clone)]
pub struct Workflow {
    /// Workflow name
    pub name: String,

    jobs: Vec<Job>,
    index: HashMap<String, usize>,
}

impl Workflow {
    /// Create a workflow from validated configuration
    pub fn from_config(config: &WorkflowConfig) -> Self {
        let defaults = JobDefaults {
            timeout_minutes: config
                .default_timeout_minutes
                .unwrap_or_else(|| JobDefaults::default().timeout_minutes),
        };

        let jobs: Vec<Job> = config
            .jobs
            .iter()
            .map(|job_config| Job::from_config(job_config, &defaults))
            .collect();

        let index = jobs
            .iter()
            .enumerate()
            .map(|(i, job)| (job.id.clone(), i))
            .collect();

        Workflow {
            name: config.name.clone(),
            jobs,
            index,
        }
    }

    /// Get a job by id
    pub fn job(&self, id: &str) -> Option<&Job> {
        self.index.get(id).map(|&i| &self.jobs[i])
    }

    /// All jobs in declaration order
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Job ids in a valid topological order of the `needs` graph
    pub fn execution_order(&self) -> Vec<String> {
        let mut result = Vec::with_capacity(self.jobs.len());
        let mut visited = HashSet::new();

        for job in &self.jobs {
            self.visit(&job.id, &mut visited, &mut result);
        }

        result
    }

    fn visit(&self, job_id: &str, visited: &mut HashSet<String>, result: &mut Vec<String>) {
        if visited.contains(job_id) {
            return;
        }
        visited.insert(job_id.to_string());

        if let Some(job) = self.job(job_id) {
            for needs in &job.needs {
                self.visit(needs, visited, result);
            }
        }

        result.push(job_id.to_string());
    }
}
