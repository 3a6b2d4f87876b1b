use anyhow::{Context, Result};
use minici::actions::CommandRunner;
use minici::badge::GistBadgeClient;
use minici::cli::commands::{RunCommand, ValidateCommand};
use minici::cli::output::{format_execution_event, format_report, style, CHECK, INFO};
use minici::cli::{Cli, Command};
use minici::core::{RunContext, RunStatus, WorkflowConfig};
use minici::execution::ExecutionEngine;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Run(cmd) => run_workflow(cmd).await?,
        Command::Validate(cmd) => validate_workflow(cmd)?,
    }

    Ok(())
}

async fn run_workflow(cmd: &RunCommand) -> Result<()> {
    let config =
        WorkflowConfig::from_file(&cmd.file).context("Failed to load workflow config")?;

    println!("{} Loaded workflow: {}", INFO, style(&config.name).bold());

    let workflow = config.to_workflow();

    let mut run = RunContext::new(cmd.event.into(), &cmd.branch);
    if let Some(repository) = &cmd.repository {
        run = run.with_repository(repository);
    }

    let mut engine = ExecutionEngine::new(CommandRunner::new(), GistBadgeClient::new());
    engine.add_event_handler(|event| {
        println!("{}", format_execution_event(&event));
    });

    println!();
    let report = engine.execute(&workflow, &run).await;

    println!("\n{}", format_report(&report));

    if report.status != RunStatus::Succeeded {
        std::process::exit(1);
    }

    Ok(())
}

fn validate_workflow(cmd: &ValidateCommand) -> Result<()> {
    match WorkflowConfig::from_file(&cmd.file) {
        Ok(config) => {
            if cmd.json {
                let summary = serde_json::json!({
                    "valid": true,
                    "name": config.name,
                    "jobs": config.jobs.iter().map(|j| &j.id).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "{} {} is valid ({} jobs)",
                    CHECK,
                    style(&cmd.file).bold(),
                    config.jobs.len()
                );
            }
            Ok(())
        }
        Err(e) => {
            if cmd.json {
                let summary = serde_json::json!({
                    "valid": false,
                    "error": e.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
                std::process::exit(1);
            }
            Err(e).context("Workflow validation failed")
        }
    }
}
