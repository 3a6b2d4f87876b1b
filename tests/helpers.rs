//! Test utility functions for minici

use async_trait::async_trait;
use minici::actions::{ActionError, ActionOutcome, ActionRequest, ActionRunner};
use minici::badge::{BadgePublisher, BadgeRequest, PublishError};
use minici::core::{EventKind, RunContext, RunReport, WorkflowConfig};
use minici::execution::ExecutionEngine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock runner with scripted outcomes, keyed by command fragment.
///
/// Commands matching no script entry succeed with empty output. Clones
/// share the script and the invocation log, so a test can keep a handle
/// while the engine owns another.
#[derive(Clone, Default)]
pub struct MockRunner {
    script: Arc<Mutex<Vec<(String, bool, String)>>>,
    invocations: Arc<Mutex<Vec<String>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script an outcome for commands containing `fragment`
    pub fn on(&self, fragment: &str, success: bool, stdout: &str) {
        self.script
            .lock()
            .unwrap()
            .push((fragment.to_string(), success, stdout.to_string()));
    }

    pub fn fail_on(&self, fragment: &str) {
        self.on(fragment, false, "");
    }

    /// Commands in invocation order
    pub fn commands(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }

    /// Position of the first invocation containing `fragment`
    pub fn position(&self, fragment: &str) -> Option<usize> {
        self.commands().iter().position(|c| c.contains(fragment))
    }
}

#[async_trait]
impl ActionRunner for MockRunner {
    async fn run(&self, request: &ActionRequest) -> Result<ActionOutcome, ActionError> {
        self.invocations
            .lock()
            .unwrap()
            .push(request.command.clone());

        let script = self.script.lock().unwrap();
        let entry = script
            .iter()
            .find(|(fragment, _, _)| request.command.contains(fragment));
        let (success, stdout) = match entry {
            Some((_, success, stdout)) => (*success, stdout.clone()),
            None => (true, String::new()),
        };

        Ok(ActionOutcome {
            success,
            stdout,
            stderr: String::new(),
        })
    }
}

/// Mock publisher that records badge requests instead of uploading
#[derive(Clone, Default)]
pub struct MockPublisher {
    published: Arc<Mutex<Vec<BadgeRequest>>>,
    fail: Arc<AtomicBool>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let publisher = Self::default();
        publisher.fail.store(true, Ordering::SeqCst);
        publisher
    }

    pub fn published(&self) -> Vec<BadgeRequest> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl BadgePublisher for MockPublisher {
    async fn publish(&self, request: &BadgeRequest) -> Result<(), PublishError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PublishError::Api {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        self.published.lock().unwrap().push(request.clone());
        Ok(())
    }
}

/// Parse a workflow and run it against mocks
pub async fn run_workflow(
    yaml: &str,
    run: RunContext,
    runner: &MockRunner,
    publisher: &MockPublisher,
) -> RunReport {
    let workflow = WorkflowConfig::from_yaml(yaml)
        .expect("workflow YAML should be valid")
        .to_workflow();
    let engine = ExecutionEngine::new(runner.clone(), publisher.clone());
    engine.execute(&workflow, &run).await
}

pub fn push_to(branch: &str) -> RunContext {
    RunContext::new(EventKind::Push, branch)
}

pub fn scheduled_on(branch: &str) -> RunContext {
    RunContext::new(EventKind::Schedule, branch)
}
