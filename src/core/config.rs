//! Workflow configuration from YAML

use crate::core::matrix::Matrix;
use crate::core::predicate::Predicate;
use crate::core::workflow::Workflow;
use crate::report;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Configuration errors, all fatal at build time, before any job runs
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read workflow file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse workflow YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("duplicate job id '{0}'")]
    DuplicateJob(String),

    #[error("job '{job}' needs unknown job '{needs}'")]
    UnknownNeeds { job: String, needs: String },

    #[error("cycle detected in job dependency graph involving '{0}'")]
    Cycle(String),

    #[error("duplicate step name '{step}' in job '{job}'")]
    DuplicateStep { job: String, step: String },

    #[error("step '{step}' in job '{job}' must declare exactly one of run, extract_coverage, publish_badge")]
    AmbiguousAction { job: String, step: String },

    #[error("step '{step}' in job '{job}' declares capture without run")]
    CaptureWithoutRun { job: String, step: String },

    #[error("duplicate derived-state key '{key}' declared in job '{job}'")]
    DuplicateOutputKey { job: String, key: String },

    #[error("step '{step}' in job '{job}' extracts from '{from}', which no earlier step captures")]
    UnknownCapture {
        job: String,
        step: String,
        from: String,
    },

    #[error("publish step '{step}' in matrix job '{job}' must pin every matrix axis in its if clause")]
    UnguardedPublish { job: String, step: String },
}

/// Top-level workflow configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Workflow name
    pub name: String,

    /// Default per-instance timeout for jobs that do not set one
    #[serde(default)]
    pub default_timeout_minutes: Option<u64>,

    /// Job definitions, in declaration order
    pub jobs: Vec<JobConfig>,
}

/// Job configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Unique job identifier
    pub id: String,

    /// Jobs that must succeed before this one runs
    #[serde(default)]
    pub needs: Vec<String>,

    /// Trigger predicate
    #[serde(rename = "if", default)]
    pub condition: Option<Predicate>,

    /// Matrix strategy
    #[serde(default)]
    pub strategy: Option<StrategyConfig>,

    /// Maximum wall-clock duration per instance, in minutes
    #[serde(default)]
    pub timeout_minutes: Option<u64>,

    /// Ordered step sequence
    pub steps: Vec<StepConfig>,
}

/// Strategy block of a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub matrix: Matrix,
}

/// Step configuration. Exactly one of `run`, `extract_coverage` or
/// `publish_badge` must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Step name, unique within its job
    pub name: String,

    /// Step-level predicate over the instance context
    #[serde(rename = "if", default)]
    pub condition: Option<Predicate>,

    /// Whether a failure of this step leaves the instance running
    #[serde(default)]
    pub continue_on_error: bool,

    /// External command to run
    #[serde(default)]
    pub run: Option<String>,

    /// Derived-state key to store the command's stdout under
    #[serde(default)]
    pub capture: Option<String>,

    /// Parse a captured coverage report
    #[serde(default)]
    pub extract_coverage: Option<ExtractConfig>,

    /// Upload a coverage badge
    #[serde(default)]
    pub publish_badge: Option<BadgeConfig>,
}

/// Inputs of a coverage extraction step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Derived-state key holding the captured report text
    pub from: String,
}

/// Inputs of a badge publication step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeConfig {
    /// Project identifier used in the badge filename
    pub project: String,

    /// Target gist id
    pub gist_id: String,

    /// Environment variable holding the auth token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Badge label
    #[serde(default = "default_badge_label")]
    pub label: String,
}

fn default_token_env() -> String {
    "GIST_SECRET".to_string()
}

fn default_badge_label() -> String {
    "coverage".to_string()
}

impl WorkflowConfig {
    /// Load workflow configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse workflow configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: WorkflowConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration. Any error here is fatal before any job
    /// runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for job in &self.jobs {
            if !seen.insert(job.id.as_str()) {
                return Err(ConfigError::DuplicateJob(job.id.clone()));
            }
        }

        let job_ids: HashSet<&str> = self.jobs.iter().map(|j| j.id.as_str()).collect();
        for job in &self.jobs {
            for needs in &job.needs {
                if !job_ids.contains(needs.as_str()) {
                    return Err(ConfigError::UnknownNeeds {
                        job: job.id.clone(),
                        needs: needs.clone(),
                    });
                }
            }
            self.validate_steps(job)?;
        }

        self.check_cycles()?;

        Ok(())
    }

    fn validate_steps(&self, job: &JobConfig) -> Result<(), ConfigError> {
        let mut step_names = HashSet::new();
        let mut output_keys: HashSet<String> = HashSet::new();

        for step in &job.steps {
            if !step_names.insert(step.name.as_str()) {
                return Err(ConfigError::DuplicateStep {
                    job: job.id.clone(),
                    step: step.name.clone(),
                });
            }

            let actions = usize::from(step.run.is_some())
                + usize::from(step.extract_coverage.is_some())
                + usize::from(step.publish_badge.is_some());
            if actions != 1 {
                return Err(ConfigError::AmbiguousAction {
                    job: job.id.clone(),
                    step: step.name.clone(),
                });
            }
            if step.capture.is_some() && step.run.is_none() {
                return Err(ConfigError::CaptureWithoutRun {
                    job: job.id.clone(),
                    step: step.name.clone(),
                });
            }

            if let Some(capture) = &step.capture {
                if !output_keys.insert(capture.clone()) {
                    return Err(ConfigError::DuplicateOutputKey {
                        job: job.id.clone(),
                        key: capture.clone(),
                    });
                }
            }

            if let Some(extract) = &step.extract_coverage {
                // The source must be captured by an earlier step
                if !output_keys.contains(&extract.from) {
                    return Err(ConfigError::UnknownCapture {
                        job: job.id.clone(),
                        step: step.name.clone(),
                        from: extract.from.clone(),
                    });
                }
                for key in [report::COVERAGE_KEY, report::COLOR_KEY] {
                    if !output_keys.insert(key.to_string()) {
                        return Err(ConfigError::DuplicateOutputKey {
                            job: job.id.clone(),
                            key: key.to_string(),
                        });
                    }
                }
            }

            if step.publish_badge.is_some() {
                self.validate_publish_gate(job, step)?;
            }
        }

        Ok(())
    }

    /// The "publish exactly once" guarantee is a configuration invariant:
    /// in a matrix job, a publish step's predicate must pin every axis so at
    /// most one sibling instance satisfies the gate.
    fn validate_publish_gate(&self, job: &JobConfig, step: &StepConfig) -> Result<(), ConfigError> {
        let Some(strategy) = &job.strategy else {
            return Ok(());
        };

        let pinned: HashSet<&str> = step
            .condition
            .iter()
            .flat_map(|p| p.fields())
            .filter_map(|f| f.strip_prefix("matrix."))
            .collect();

        for (axis, _) in strategy.matrix.axes() {
            if !pinned.contains(axis.as_str()) {
                return Err(ConfigError::UnguardedPublish {
                    job: job.id.clone(),
                    step: step.name.clone(),
                });
            }
        }

        Ok(())
    }

    /// DFS cycle check over the `needs` graph
    fn check_cycles(&self) -> Result<(), ConfigError> {
        let mut visited = HashSet::new();
        let mut stack = HashSet::new();

        for job in &self.jobs {
            if !visited.contains(&job.id) {
                self.dfs_check(&job.id, &mut visited, &mut stack)?;
            }
        }

        Ok(())
    }

    fn dfs_check(
        &self,
        job_id: &str,
        visited: &mut HashSet<String>,
        stack: &mut HashSet<String>,
    ) -> Result<(), ConfigError> {
        visited.insert(job_id.to_string());
        stack.insert(job_id.to_string());

        if let Some(job) = self.jobs.iter().find(|j| j.id == job_id) {
            for needs in &job.needs {
                if stack.contains(needs) {
                    return Err(ConfigError::Cycle(needs.clone()));
                }
                if !visited.contains(needs) {
                    self.dfs_check(needs, visited, stack)?;
                }
            }
        }

        stack.remove(job_id);
        Ok(())
    }

    /// Convert config to the workflow domain model
    pub fn to_workflow(&self) -> Workflow {
        Workflow::from_config(self)
    }
}
