//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run has not started
    Pending,
    /// Run is currently executing
    Running,
    /// Every non-skipped instance succeeded
    Succeeded,
    /// At least one instance failed
    Failed,
}

/// Why an instance was skipped rather than run.
///
/// Predicate skips and propagated skips are recorded separately so every
/// terminal state stays attributable to exactly one cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The job's trigger predicate evaluated false
    PredicateFalse,
    /// A job this one needs did not reach `succeeded`
    Upstream { job: String },
}

/// Terminal or in-flight result of a single job instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunResult {
    /// Waiting on dependencies
    Pending,
    /// Steps are executing
    Running { started_at: DateTime<Utc> },
    /// All steps completed
    Succeeded {
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    },
    /// A fatal step failed, the instance timed out, or derived state was
    /// invalid
    Failed {
        error: String,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    },
    /// Never ran
    Skipped { reason: SkipReason },
}

impl RunResult {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunResult::Succeeded { .. } | RunResult::Failed { .. } | RunResult::Skipped { .. }
        )
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, RunResult::Succeeded { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RunResult::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RunResult::Skipped { .. })
    }
}

/// One job instance's record in a run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceRecord {
    /// Identifier of the job this instance belongs to
    pub job: String,

    /// Display key, e.g. `test (3.9)` for a matrix instance
    pub key: String,

    /// Matrix-bound axis values (empty for non-matrix jobs)
    pub values: BTreeMap<String, String>,

    /// Terminal result
    pub result: RunResult,
}

/// Final report for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run id
    pub run_id: Uuid,

    /// Overall status, the logical AND of all non-skipped instances
    pub status: RunStatus,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished
    pub finished_at: Option<DateTime<Utc>>,

    /// Per-instance terminal results
    pub instances: Vec<InstanceRecord>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            status: RunStatus::Pending,
            started_at: Utc::now(),
            finished_at: None,
            instances: Vec::new(),
        }
    }

    pub fn record(&mut self, record: InstanceRecord) {
        self.instances.push(record);
    }

    /// Fold instance results into the final status and stamp the end time.
    pub fn finish(&mut self) {
        let failed = self.instances.iter().any(|i| i.result.is_failed());
        self.status = if failed {
            RunStatus::Failed
        } else {
            RunStatus::Succeeded
        };
        self.finished_at = Some(Utc::now());
    }

    /// All instance records for one job, in expansion order
    pub fn job_instances(&self, job: &str) -> Vec<&InstanceRecord> {
        self.instances.iter().filter(|i| i.job == job).collect()
    }

    /// Look up a single instance by its display key
    pub fn instance(&self, key: &str) -> Option<&InstanceRecord> {
        self.instances.iter().find(|i| i.key == key)
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
