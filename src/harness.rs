// ────────────────────────────────
// src/harness.rs
// launch -> delay (per instance) -> settle -> [readiness] -> probe
// ────────────────────────────────

use crate::config::HarnessConfig;
use crate::health::{ReadinessChecker, ReadinessResult};
use crate::launcher::{LaunchCommand, LaunchError, Spawner};
use crate::probe::{Probe, ProbeError, ProbeResponse};
use std::io::Write;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

pub struct Harness<S: Spawner> {
    config: HarnessConfig,
    spawner: S,
}

#[derive(Debug, Clone)]
pub struct LaunchRecord {
    pub command: String,
    pub port: u16,
    pub pid: Option<u32>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub launches: Vec<LaunchRecord>,
    pub readiness: Vec<ReadinessResult>,
    /// Time from the first launch to the moment the probe was issued.
    pub probe_after: Duration,
    pub response: ProbeResponse,
}

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("failed to build readiness client: {0}")]
    Readiness(#[source] reqwest::Error),
}

impl<S: Spawner> Harness<S> {
    pub fn new(config: HarnessConfig, spawner: S) -> Self {
        Self { config, spawner }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn commands(&self) -> Result<Vec<LaunchCommand>, LaunchError> {
        self.config
            .instances
            .iter()
            .map(|instance| LaunchCommand::for_instance(&self.config.program, instance))
            .collect()
    }

    /// Start every instance in order, pausing after each. Spawn failures are
    /// recorded and logged, never fatal.
    pub async fn launch_all(&self) -> Result<Vec<LaunchRecord>, LaunchError> {
        let commands = self.commands()?;
        let mut records = Vec::with_capacity(commands.len());

        for command in commands {
            let record = match self.spawner.spawn(&command).await {
                Ok(spawned) => {
                    info!(
                        spawner = self.spawner.name(),
                        port = command.port,
                        pid = ?spawned.pid,
                        "launched `{}`",
                        command
                    );
                    LaunchRecord {
                        command: command.to_string(),
                        port: command.port,
                        pid: spawned.pid,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(port = command.port, %e, "launch failed, continuing");
                    LaunchRecord {
                        command: command.to_string(),
                        port: command.port,
                        pid: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            records.push(record);

            sleep(self.config.launch_delay()).await;
        }

        Ok(records)
    }

    pub async fn run(&self) -> Result<RunReport, HarnessError> {
        // Build the probe up front so a bad URL fails before anything is launched.
        let probe = Probe::new(&self.config.probe)?;
        let start = Instant::now();

        let launches = self.launch_all().await?;

        info!(delay = ?self.config.settle_delay(), "waiting for instances to settle");
        sleep(self.config.settle_delay()).await;

        let readiness = if self.config.readiness.enabled {
            let checker = ReadinessChecker::new(self.config.readiness.clone(), &self.config.host)
                .map_err(HarnessError::Readiness)?;
            checker.wait_all(&self.config.ports()).await
        } else {
            Vec::new()
        };

        let probe_after = start.elapsed();
        let response = probe.fire().await?;
        info!(
            status = response.status,
            lines = response.lines.len(),
            after = ?probe_after,
            "probe succeeded"
        );

        Ok(RunReport {
            launches,
            readiness,
            probe_after,
            response,
        })
    }
}

/// Print each response line on its own line.
pub fn write_lines<W: Write>(lines: &[String], mut out: W) -> std::io::Result<()> {
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()
}
