//! Shell command runner

use crate::actions::{ActionError, ActionOutcome, ActionRequest, ActionRunner};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs step commands through the system shell
#[derive(Debug, Clone, Default)]
pub struct CommandRunner;

impl CommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ActionRunner for CommandRunner {
    async fn run(&self, request: &ActionRequest) -> Result<ActionOutcome, ActionError> {
        debug!("Spawning command for step {}: {}", request.step, request.command);

        let output = Command::new("sh")
            .arg("-c")
            .arg(&request.command)
            .kill_on_drop(true)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            warn!(
                "Command for step {} exited with code {}: {}",
                request.step,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }

        Ok(ActionOutcome {
            success: output.status.success(),
            stdout,
            stderr,
        })
    }
}
