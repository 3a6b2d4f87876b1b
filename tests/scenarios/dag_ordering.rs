//! Test: dependency ordering and failure propagation

use crate::helpers::*;
use minici::core::{ConfigError, RunResult, RunStatus, SkipReason, WorkflowConfig};

#[tokio::test]
async fn test_jobs_run_in_dependency_order() {
    let yaml = r#"
name: chain
jobs:
  - id: deploy
    needs: [test]
    steps: [{ name: ship, run: "deploy-cmd" }]
  - id: build
    steps: [{ name: make, run: "build-cmd" }]
  - id: test
    needs: [build]
    steps: [{ name: pytest, run: "test-cmd" }]
"#;

    let runner = MockRunner::new();
    let publisher = MockPublisher::new();
    let report = run_workflow(yaml, push_to("main"), &runner, &publisher).await;

    assert_eq!(report.status, RunStatus::Succeeded);
    let build = runner.position("build-cmd").unwrap();
    let test = runner.position("test-cmd").unwrap();
    let deploy = runner.position("deploy-cmd").unwrap();
    assert!(build < test);
    assert!(test < deploy);
}

#[tokio::test]
async fn test_diamond_join_waits_for_both_branches() {
    let yaml = r#"
name: diamond
jobs:
  - id: build
    steps: [{ name: make, run: "build-cmd" }]
  - id: unit
    needs: [build]
    steps: [{ name: pytest, run: "unit-cmd" }]
  - id: integration
    needs: [build]
    steps: [{ name: pytest, run: "integration-cmd" }]
  - id: report
    needs: [unit, integration]
    steps: [{ name: aggregate, run: "report-cmd" }]
"#;

    let runner = MockRunner::new();
    let publisher = MockPublisher::new();
    let report = run_workflow(yaml, push_to("main"), &runner, &publisher).await;

    assert_eq!(report.status, RunStatus::Succeeded);
    let join = runner.position("report-cmd").unwrap();
    assert!(runner.position("unit-cmd").unwrap() < join);
    assert!(runner.position("integration-cmd").unwrap() < join);
}

#[tokio::test]
async fn test_failed_job_skips_all_downstream() {
    let yaml = r#"
name: chain
jobs:
  - id: lint
    steps: [{ name: flake8, run: "lint-cmd" }]
  - id: test
    needs: [lint]
    steps: [{ name: pytest, run: "test-cmd" }]
  - id: deploy
    needs: [test]
    steps: [{ name: ship, run: "deploy-cmd" }]
"#;

    let runner = MockRunner::new();
    runner.fail_on("lint-cmd");
    let publisher = MockPublisher::new();
    let report = run_workflow(yaml, push_to("main"), &runner, &publisher).await;

    assert_eq!(report.status, RunStatus::Failed);
    assert!(report.instance("lint").unwrap().result.is_failed());

    // Downstream jobs never ran, and record who blocked them
    assert!(runner.position("test-cmd").is_none());
    assert!(runner.position("deploy-cmd").is_none());
    match &report.instance("test").unwrap().result {
        RunResult::Skipped {
            reason: SkipReason::Upstream { job },
        } => assert_eq!(job, "lint"),
        other => panic!("expected upstream skip, got {:?}", other),
    }
    match &report.instance("deploy").unwrap().result {
        RunResult::Skipped {
            reason: SkipReason::Upstream { job },
        } => assert_eq!(job, "test"),
        other => panic!("expected upstream skip, got {:?}", other),
    }
}

#[tokio::test]
async fn test_sibling_of_failed_job_still_runs() {
    let yaml = r#"
name: fanout
jobs:
  - id: build
    steps: [{ name: make, run: "build-cmd" }]
  - id: unit
    needs: [build]
    steps: [{ name: pytest, run: "unit-cmd" }]
  - id: docs
    needs: [build]
    steps: [{ name: sphinx, run: "docs-cmd" }]
"#;

    let runner = MockRunner::new();
    runner.fail_on("unit-cmd");
    let publisher = MockPublisher::new();
    let report = run_workflow(yaml, push_to("main"), &runner, &publisher).await;

    assert_eq!(report.status, RunStatus::Failed);
    assert!(report.instance("docs").unwrap().result.is_succeeded());
}

#[test]
fn test_dependency_cycle_is_a_config_error() {
    let yaml = r#"
name: cyclic
jobs:
  - id: a
    needs: [b]
    steps: [{ name: s, run: "true" }]
  - id: b
    needs: [a]
    steps: [{ name: s, run: "true" }]
"#;

    assert!(matches!(
        WorkflowConfig::from_yaml(yaml),
        Err(ConfigError::Cycle(_))
    ));
}
