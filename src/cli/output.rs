//! CLI output formatting

use crate::{
    core::{RunReport, RunResult, RunStatus, SkipReason},
    execution::ExecutionEvent,
};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static BADGE: Emoji<'_, '_> = Emoji("🏷️  ", "# ");

/// Format a run status for display
pub fn format_status(status: RunStatus) -> String {
    match status {
        RunStatus::Pending => style("PENDING").dim().to_string(),
        RunStatus::Running => style("RUNNING").yellow().to_string(),
        RunStatus::Succeeded => style("SUCCEEDED").green().to_string(),
        RunStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format one instance result for the summary table
pub fn format_result(result: &RunResult) -> String {
    match result {
        RunResult::Pending => style("PENDING").dim().to_string(),
        RunResult::Running { .. } => style("RUNNING").yellow().to_string(),
        RunResult::Succeeded { .. } => style("SUCCEEDED").green().to_string(),
        RunResult::Failed { error, .. } => {
            format!("{} ({})", style("FAILED").red(), style(error).dim())
        }
        RunResult::Skipped { reason } => {
            let why = match reason {
                SkipReason::PredicateFalse => "condition false".to_string(),
                SkipReason::Upstream { job } => format!("needs {}", job),
            };
            format!("{} ({})", style("SKIPPED").dim(), style(why).dim())
        }
    }
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::RunStarted { run_id, workflow } => format!(
            "{} Starting workflow {} ({})",
            ROCKET,
            style(workflow).bold(),
            style(&run_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::JobSkipped { job, reason } => {
            let why = match reason {
                SkipReason::PredicateFalse => "condition false".to_string(),
                SkipReason::Upstream { job } => format!("{} did not succeed", job),
            };
            format!("{} {} ({})", SKIP, style(job).dim(), style(why).dim())
        }
        ExecutionEvent::InstanceStarted { instance } => {
            format!("{} {}", SPINNER, style(instance).cyan())
        }
        ExecutionEvent::StepStarted { instance, step } => {
            format!("   {} {} · {}", SPINNER, style(instance).dim(), step)
        }
        ExecutionEvent::StepCompleted { instance, step } => {
            format!("   {} {} · {}", CHECK, style(instance).dim(), step)
        }
        ExecutionEvent::StepFailed {
            instance,
            step,
            error,
            fatal,
        } => {
            let icon = if *fatal { CROSS } else { WARN };
            format!(
                "   {} {} · {}: {}",
                icon,
                style(instance).dim(),
                step,
                style(error).dim()
            )
        }
        ExecutionEvent::StepSkipped { instance, step } => {
            format!("   {} {} · {}", SKIP, style(instance).dim(), style(step).dim())
        }
        ExecutionEvent::BadgePublished {
            instance,
            filename,
            message,
        } => format!(
            "   {} {} · published {} ({})",
            BADGE,
            style(instance).dim(),
            style(filename).cyan(),
            message
        ),
        ExecutionEvent::InstanceFinished { instance, result } => match result {
            RunResult::Succeeded { .. } => format!("{} {}", CHECK, style(instance).green()),
            RunResult::Failed { error, .. } => {
                format!("{} {}: {}", CROSS, style(instance).red(), style(error).dim())
            }
            _ => format!("{} {}", INFO, style(instance).dim()),
        },
        ExecutionEvent::RunCompleted { run_id, status } => format!(
            "{} Run ({}) {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
    }
}

/// Format the final per-instance summary
pub fn format_report(report: &RunReport) -> String {
    let mut lines = Vec::with_capacity(report.instances.len() + 1);
    for instance in &report.instances {
        lines.push(format!(
            "  {}  {}",
            style(&instance.key).bold(),
            format_result(&instance.result)
        ));
    }
    lines.push(format!("\nRun {}", format_status(report.status)));
    lines.join("\n")
}
