//! Trigger predicates over run and instance context

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A boolean gate: a set of equality clauses combined with AND.
///
/// Clause keys name context fields (`branch`, `repository`, `event`) or
/// matrix-bound values (`matrix.<axis>`). A clause whose field is missing
/// from the context evaluates false, never an error. An empty predicate is
/// always true, matching a job with no `if:` at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Predicate {
    clauses: BTreeMap<String, String>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clause(mut self, field: impl Into<String>, expected: impl Into<String>) -> Self {
        self.clauses.insert(field.into(), expected.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Fields this predicate constrains
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.clauses.keys().map(String::as_str)
    }

    /// Evaluate against a context lookup. No side effects.
    pub fn evaluate<F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        self.clauses
            .iter()
            .all(|(field, expected)| lookup(field).is_some_and(|actual| actual == *expected))
    }
}
