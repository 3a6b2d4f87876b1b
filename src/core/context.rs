//! Run context and instance-scoped state

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Kind of event that triggered the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A push to a branch
    Push,
    /// A scheduled (cron-like) invocation
    Schedule,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Push => "push",
            EventKind::Schedule => "schedule",
        }
    }
}

/// Context fixed at the start of a run and read-only for its whole duration.
///
/// Every evaluator and executor receives this by reference; there is no
/// mutable global run state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunContext {
    /// What triggered the run
    pub event: EventKind,

    /// Target branch name
    pub branch: String,

    /// Repository identity (e.g. "org/name"), if known
    pub repository: Option<String>,
}

impl RunContext {
    pub fn new(event: EventKind, branch: impl Into<String>) -> Self {
        Self {
            event,
            branch: branch.into(),
            repository: None,
        }
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    /// Look up a context field by name. Unknown fields resolve to `None`,
    /// which predicate evaluation treats as a false clause, never an error.
    pub fn lookup(&self, field: &str) -> Option<String> {
        match field {
            "event" => Some(self.event.as_str().to_string()),
            "branch" => Some(self.branch.clone()),
            "repository" => self.repository.clone(),
            _ => None,
        }
    }
}

/// Error raised when a step produces a derived-state key that already exists
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("duplicate derived-state key '{0}'")]
    DuplicateKey(String),
}

/// Execution context for one job instance.
///
/// Combines the immutable run context, the instance's matrix-bound values and
/// the derived-state entries produced by earlier steps of the same instance.
/// Instances never share derived state with each other.
#[derive(Debug, Clone)]
pub struct InstanceContext {
    run: RunContext,
    matrix: BTreeMap<String, String>,
    derived: HashMap<String, String>,
}

impl InstanceContext {
    pub fn new(run: RunContext, matrix: BTreeMap<String, String>) -> Self {
        Self {
            run,
            matrix,
            derived: HashMap::new(),
        }
    }

    pub fn run(&self) -> &RunContext {
        &self.run
    }

    /// Resolve a key for predicates and interpolation.
    ///
    /// `matrix.<axis>` resolves to the instance's bound axis value; derived
    /// keys take precedence over run-context fields on collision.
    pub fn lookup(&self, key: &str) -> Option<String> {
        if let Some(axis) = key.strip_prefix("matrix.") {
            return self.matrix.get(axis).cloned();
        }
        if let Some(value) = self.derived.get(key) {
            return Some(value.clone());
        }
        self.run.lookup(key)
    }

    /// Record a derived-state entry. Key collisions are a configuration
    /// error, not an overwrite.
    pub fn set_derived(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ContextError> {
        let key = key.into();
        if self.derived.contains_key(&key) {
            return Err(ContextError::DuplicateKey(key));
        }
        self.derived.insert(key, value.into());
        Ok(())
    }

    pub fn derived(&self, key: &str) -> Option<&str> {
        self.derived.get(key).map(String::as_str)
    }

    /// Replace `${{ key }}` placeholders with resolved context values.
    /// Unknown keys are left in place so failures surface in command output.
    pub fn interpolate(&self, template: &str) -> String {
        let mut rendered = template.to_string();
        for (key, value) in self.rendering_entries() {
            let placeholder = format!("${{{{ {} }}}}", key);
            rendered = rendered.replace(&placeholder, &value);
        }
        rendered
    }

    fn rendering_entries(&self) -> Vec<(String, String)> {
        let mut entries = vec![
            ("event".to_string(), self.run.event.as_str().to_string()),
            ("branch".to_string(), self.run.branch.clone()),
        ];
        if let Some(repo) = &self.run.repository {
            entries.push(("repository".to_string(), repo.clone()));
        }
        for (axis, value) in &self.matrix {
            entries.push((format!("matrix.{}", axis), value.clone()));
        }
        for (key, value) in &self.derived {
            entries.push((key.clone(), value.clone()));
        }
        entries
    }
}
