//! Test: matrix expansion and trigger-predicate skips

use crate::helpers::*;
use minici::core::{RunResult, RunStatus, SkipReason};

const MATRIX_WORKFLOW: &str = r#"
name: matrix
jobs:
  - id: test
    strategy:
      matrix:
        python: ["3.7", "3.8", "3.9", "3.10"]
    steps:
      - name: pytest
        run: "pytest-${{ matrix.python }}"
"#;

#[tokio::test]
async fn test_matrix_expands_in_declaration_order() {
    let runner = MockRunner::new();
    let publisher = MockPublisher::new();
    let report = run_workflow(MATRIX_WORKFLOW, push_to("main"), &runner, &publisher).await;

    assert_eq!(report.status, RunStatus::Succeeded);
    let instances = report.job_instances("test");
    assert_eq!(instances.len(), 4);
    for version in ["3.7", "3.8", "3.9", "3.10"] {
        assert!(report.instance(&format!("test ({})", version)).is_some());
    }
}

#[tokio::test]
async fn test_one_instance_failure_leaves_siblings_untouched() {
    let runner = MockRunner::new();
    runner.fail_on("pytest-3.8");
    let publisher = MockPublisher::new();
    let report = run_workflow(MATRIX_WORKFLOW, push_to("main"), &runner, &publisher).await;

    assert_eq!(report.status, RunStatus::Failed);
    assert!(report.instance("test (3.8)").unwrap().result.is_failed());
    for version in ["3.7", "3.9", "3.10"] {
        assert!(report
            .instance(&format!("test ({})", version))
            .unwrap()
            .result
            .is_succeeded());
    }
}

const SCHEDULED_WORKFLOW: &str = r#"
name: nightly
jobs:
  - id: lint
    steps: [{ name: flake8, run: "lint-cmd" }]
  - id: latest-deps
    needs: [lint]
    if: { branch: main, event: schedule }
    steps: [{ name: pytest, run: "latest-deps-cmd" }]
"#;

#[tokio::test]
async fn test_scheduled_job_skipped_on_push() {
    let runner = MockRunner::new();
    let publisher = MockPublisher::new();
    let report = run_workflow(SCHEDULED_WORKFLOW, push_to("feature-x"), &runner, &publisher).await;

    // A predicate skip is not a failure
    assert_eq!(report.status, RunStatus::Succeeded);
    assert!(runner.position("latest-deps-cmd").is_none());
    assert!(matches!(
        report.instance("latest-deps").unwrap().result,
        RunResult::Skipped {
            reason: SkipReason::PredicateFalse
        }
    ));
}

#[tokio::test]
async fn test_scheduled_job_runs_on_schedule_for_main() {
    let runner = MockRunner::new();
    let publisher = MockPublisher::new();
    let report = run_workflow(SCHEDULED_WORKFLOW, scheduled_on("main"), &runner, &publisher).await;

    assert_eq!(report.status, RunStatus::Succeeded);
    assert!(runner.position("latest-deps-cmd").is_some());
    assert!(report.instance("latest-deps").unwrap().result.is_succeeded());
}

#[tokio::test]
async fn test_skipped_upstream_propagates_to_dependents() {
    let yaml = r#"
name: nightly
jobs:
  - id: refresh
    if: { event: schedule }
    steps: [{ name: regen, run: "refresh-cmd" }]
  - id: verify
    needs: [refresh]
    steps: [{ name: pytest, run: "verify-cmd" }]
"#;

    let runner = MockRunner::new();
    let publisher = MockPublisher::new();
    let report = run_workflow(yaml, push_to("main"), &runner, &publisher).await;

    assert_eq!(report.status, RunStatus::Succeeded);
    assert!(runner.commands().is_empty());
    match &report.instance("verify").unwrap().result {
        RunResult::Skipped {
            reason: SkipReason::Upstream { job },
        } => assert_eq!(job, "refresh"),
        other => panic!("expected upstream skip, got {:?}", other),
    }
}

#[tokio::test]
async fn test_matrix_job_with_predicate_skips_every_instance() {
    let yaml = r#"
name: matrix
jobs:
  - id: test
    if: { branch: main }
    strategy:
      matrix:
        python: ["3.8", "3.9"]
    steps:
      - name: pytest
        run: "pytest"
"#;

    let runner = MockRunner::new();
    let publisher = MockPublisher::new();
    let report = run_workflow(yaml, push_to("feature-x"), &runner, &publisher).await;

    assert_eq!(report.status, RunStatus::Succeeded);
    let instances = report.job_instances("test");
    assert_eq!(instances.len(), 2);
    assert!(instances.iter().all(|i| i.result.is_skipped()));
}
