//! Job and step domain models

use crate::core::{
    config::{JobConfig, StepConfig},
    matrix::Matrix,
    predicate::Predicate,
};
use std::collections::BTreeMap;

/// A named unit of work: an ordered step sequence, dependency edges, an
/// optional trigger predicate and an optional matrix strategy.
#[derive(Debug, Clone)]
pub struct Job {
    /// Unique job identifier
    pub id: String,

    /// Identifiers of jobs that must succeed before this one runs
    pub needs: Vec<String>,

    /// Trigger predicate; `None` means the job always runs
    pub predicate: Option<Predicate>,

    /// Matrix strategy; `None` means a single instance
    pub matrix: Option<Matrix>,

    /// Maximum wall-clock duration for each instance
    pub timeout_minutes: u64,

    /// Ordered step sequence shared by every instance
    pub steps: Vec<Step>,
}

/// A single step of a job: an opaque action plus its gating and failure
/// policy.
#[derive(Debug, Clone)]
pub struct Step {
    /// Step name, unique within the job
    pub name: String,

    /// What the step does
    pub action: StepAction,

    /// Step-level predicate, evaluated against the instance context
    pub predicate: Option<Predicate>,

    /// Whether a failure of this step is non-fatal for the instance
    pub continue_on_error: bool,
}

/// The action a step performs
#[derive(Debug, Clone)]
pub enum StepAction {
    /// Run an external command. Its captured stdout is stored under the
    /// `capture` key as derived state when one is declared.
    Run {
        command: String,
        capture: Option<String>,
    },

    /// Parse a previously captured coverage report and store the percentage
    /// and color band as derived state.
    ExtractCoverage { from: String },

    /// Upload a coverage badge for this run's branch.
    PublishBadge(BadgeSpec),
}

/// Configuration of a badge publication step
#[derive(Debug, Clone)]
pub struct BadgeSpec {
    /// Project identifier used in the badge filename
    pub project: String,

    /// Target gist holding the badge documents
    pub gist_id: String,

    /// Environment variable holding the auth token
    pub token_env: String,

    /// Badge label, e.g. "coverage"
    pub label: String,
}

/// One concrete execution of a job for one matrix combination
#[derive(Debug, Clone)]
pub struct JobInstance {
    /// Identifier of the job this instance belongs to
    pub job_id: String,

    /// Display key: the job id, suffixed with the matrix label when present
    pub key: String,

    /// Matrix-bound axis values (empty for non-matrix jobs)
    pub values: BTreeMap<String, String>,
}

/// Workflow-level defaults applied when a job omits a setting
#[derive(Debug, Clone)]
pub struct JobDefaults {
    pub timeout_minutes: u64,
}

impl Default for JobDefaults {
    fn default() -> Self {
        Self {
            timeout_minutes: 60,
        }
    }
}

impl Job {
    /// Build a job from its validated configuration
    pub fn from_config(config: &JobConfig, defaults: &JobDefaults) -> Self {
        Job {
            id: config.id.clone(),
            needs: config.needs.clone(),
            predicate: config.condition.clone(),
            matrix: config.strategy.as_ref().map(|s| s.matrix.clone()),
            timeout_minutes: config.timeout_minutes.unwrap_or(defaults.timeout_minutes),
            steps: config.steps.iter().map(Step::from_config).collect(),
        }
    }

    /// Expand this job into its instances.
    ///
    /// A job without a matrix yields exactly one instance; a matrix job
    /// yields one instance per combination, in declaration order. Instances
    /// are independent of each other.
    pub fn expand(&self) -> Vec<JobInstance> {
        match &self.matrix {
            None => vec![JobInstance {
                job_id: self.id.clone(),
                key: self.id.clone(),
                values: BTreeMap::new(),
            }],
            Some(matrix) => matrix
                .expand()
                .into_iter()
                .map(|(label, values)| JobInstance {
                    job_id: self.id.clone(),
                    key: format!("{} ({})", self.id, label),
                    values,
                })
                .collect(),
        }
    }
}

impl Step {
    fn from_config(config: &StepConfig) -> Self {
        // validate() guarantees exactly one action is set
        let action = if let Some(command) = &config.run {
            StepAction::Run {
                command: command.clone(),
                capture: config.capture.clone(),
            }
        } else if let Some(extract) = &config.extract_coverage {
            StepAction::ExtractCoverage {
                from: extract.from.clone(),
            }
        } else {
            let badge = config
                .publish_badge
                .as_ref()
                .expect("step config has exactly one action");
            StepAction::PublishBadge(BadgeSpec {
                project: badge.project.clone(),
                gist_id: badge.gist_id.clone(),
                token_env: badge.token_env.clone(),
                label: badge.label.clone(),
            })
        };

        Step {
            name: config.name.clone(),
            action,
            predicate: config.condition.clone(),
            continue_on_error: config.continue_on_error,
        }
    }
}
