//! Test: coverage extraction and badge publication end to end

use crate::helpers::*;
use minici::core::RunStatus;

const COVERAGE_WORKFLOW: &str = r#"
name: coverage
jobs:
  - id: test
    strategy:
      matrix:
        python: ["3.8", "3.9", "3.10"]
    steps:
      - name: pytest
        run: "pytest --cov"
        capture: coverage_report
      - name: coverage
        extract_coverage:
          from: coverage_report
      - name: badge
        if: { "matrix.python": "3.9" }
        publish_badge:
          project: probeye
          gist_id: abc123
"#;

const REPORT_67: &str = "\
Name                 Stmts   Miss  Cover
----------------------------------------
probeye/core.py         80     20    75%
probeye/solver.py       40     20    50%
----------------------------------------
TOTAL                  120     40    67%
";

#[tokio::test]
async fn test_badge_published_once_from_designated_instance() {
    let runner = MockRunner::new();
    runner.on("pytest --cov", true, REPORT_67);
    let publisher = MockPublisher::new();
    let report = run_workflow(COVERAGE_WORKFLOW, push_to("main"), &runner, &publisher).await;

    assert_eq!(report.status, RunStatus::Succeeded);
    let published = publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].filename, "probeye_main_coverage.json");
    assert_eq!(published[0].label, "coverage");
    assert_eq!(published[0].message, "67%");
    assert_eq!(published[0].color, "yellow");
    assert_eq!(published[0].gist_id, "abc123");
}

#[tokio::test]
async fn test_badge_filename_tracks_branch() {
    let runner = MockRunner::new();
    runner.on("pytest --cov", true, REPORT_67);
    let publisher = MockPublisher::new();
    run_workflow(COVERAGE_WORKFLOW, push_to("feature-x"), &runner, &publisher).await;

    let published = publisher.published();
    assert_eq!(published[0].filename, "probeye_feature-x_coverage.json");
}

#[tokio::test]
async fn test_high_coverage_gets_brightgreen() {
    let runner = MockRunner::new();
    runner.on("pytest --cov", true, "TOTAL 200 8 96%\n");
    let publisher = MockPublisher::new();
    run_workflow(COVERAGE_WORKFLOW, push_to("main"), &runner, &publisher).await;

    let published = publisher.published();
    assert_eq!(published[0].message, "96%");
    assert_eq!(published[0].color, "brightgreen");
}

#[tokio::test]
async fn test_unparseable_report_fails_run_without_publishing() {
    let runner = MockRunner::new();
    runner.on("pytest --cov", true, "collected 42 items, all passed\n");
    let publisher = MockPublisher::new();
    let report = run_workflow(COVERAGE_WORKFLOW, push_to("main"), &runner, &publisher).await;

    assert_eq!(report.status, RunStatus::Failed);
    assert!(publisher.published().is_empty());
    // Every instance fails on its own extraction step
    assert!(report
        .job_instances("test")
        .iter()
        .all(|i| i.result.is_failed()));
}

#[tokio::test]
async fn test_failed_designated_instance_publishes_nothing() {
    // Only the designated 3.9 instance fails its test step
    let yaml = r#"
name: coverage
jobs:
  - id: test
    strategy:
      matrix:
        python: ["3.8", "3.9"]
    steps:
      - name: pytest
        run: "pytest --cov-${{ matrix.python }}"
        capture: coverage_report
      - name: coverage
        extract_coverage:
          from: coverage_report
      - name: badge
        if: { "matrix.python": "3.9" }
        publish_badge:
          project: probeye
          gist_id: abc123
"#;
    let runner = MockRunner::new();
    runner.on("pytest --cov-3.8", true, REPORT_67);
    runner.fail_on("pytest --cov-3.9");
    let publisher = MockPublisher::new();
    let report = run_workflow(yaml, push_to("main"), &runner, &publisher).await;

    assert_eq!(report.status, RunStatus::Failed);
    assert!(report.instance("test (3.8)").unwrap().result.is_succeeded());
    assert!(report.instance("test (3.9)").unwrap().result.is_failed());
    assert!(publisher.published().is_empty());
}

#[tokio::test]
async fn test_publisher_error_fails_the_publishing_instance() {
    let runner = MockRunner::new();
    runner.on("pytest --cov", true, REPORT_67);
    let publisher = MockPublisher::failing();
    let report = run_workflow(COVERAGE_WORKFLOW, push_to("main"), &runner, &publisher).await;

    assert_eq!(report.status, RunStatus::Failed);
    assert!(report.instance("test (3.9)").unwrap().result.is_failed());
    assert!(report.instance("test (3.8)").unwrap().result.is_succeeded());
}

#[tokio::test]
async fn test_single_job_publishes_without_matrix_pin() {
    let yaml = r#"
name: coverage
jobs:
  - id: test
    steps:
      - name: pytest
        run: "pytest --cov"
        capture: coverage_report
      - name: coverage
        extract_coverage:
          from: coverage_report
      - name: badge
        publish_badge:
          project: probeye
          gist_id: abc123
"#;

    let runner = MockRunner::new();
    runner.on("pytest --cov", true, "TOTAL 100 45 55%\n");
    let publisher = MockPublisher::new();
    let report = run_workflow(yaml, push_to("main"), &runner, &publisher).await;

    assert_eq!(report.status, RunStatus::Succeeded);
    let published = publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].color, "orange");
}
