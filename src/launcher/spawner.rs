// ────────────────────────────────
// src/launcher/spawner.rs
// Fire-and-forget process creation. Children are never waited on and
// outlive the harness.
// ────────────────────────────────

use crate::launcher::LaunchCommand;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnedProcess {
    pub pid: Option<u32>,
}

#[async_trait]
pub trait Spawner: Send + Sync {
    async fn spawn(&self, command: &LaunchCommand) -> Result<SpawnedProcess, LaunchError>;

    fn name(&self) -> &'static str;
}

/// Starts real OS processes.
#[derive(Debug, Default, Clone)]
pub struct ProcessSpawner;

impl ProcessSpawner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Spawner for ProcessSpawner {
    async fn spawn(&self, command: &LaunchCommand) -> Result<SpawnedProcess, LaunchError> {
        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            // Keep the harness's stdout for the response; children log to stderr.
            .stdout(Stdio::null())
            .kill_on_drop(false)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                command: command.to_string(),
                source,
            })?;

        // Dropping the handle detaches the child.
        Ok(SpawnedProcess { pid: child.id() })
    }

    fn name(&self) -> &'static str {
        "process"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("no program configured to launch")]
    EmptyProgram,

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}
