// src/config/models.rs
use crate::node::{Predecessor, Role};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Everything the smoke harness needs to launch a chain and probe it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Program and leading arguments; each instance appends
    /// `<role> <port> <predecessor>`.
    pub program: Vec<String>,
    /// Launch order. Each predecessor must be the port of an earlier entry.
    pub instances: Vec<InstanceConfig>,
    /// Host the instances listen on, used by readiness polling.
    pub host: String,
    pub launch_delay_ms: u64,
    pub settle_delay_ms: u64,
    pub readiness: ReadinessConfig,
    pub probe: ProbeConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            instances: vec![
                InstanceConfig::new(Role::One, 8000, Predecessor::None),
                InstanceConfig::new(Role::One, 8001, Predecessor::Port(8000)),
                InstanceConfig::new(Role::One, 8002, Predecessor::Port(8001)),
            ],
            host: "127.0.0.1".to_string(),
            launch_delay_ms: 1000,
            settle_delay_ms: 2000,
            readiness: ReadinessConfig::default(),
            probe: ProbeConfig::default(),
        }
    }
}

impl HarnessConfig {
    pub fn launch_delay(&self) -> Duration {
        Duration::from_millis(self.launch_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Minimum time that passes between the first launch and the probe.
    /// Saturates at `Duration::MAX`.
    pub fn planned_delay(&self) -> Duration {
        let launches = u32::try_from(self.instances.len()).unwrap_or(u32::MAX);
        self.launch_delay()
            .checked_mul(launches)
            .and_then(|d| d.checked_add(self.settle_delay()))
            .unwrap_or(Duration::MAX)
    }

    pub fn ports(&self) -> Vec<u16> {
        self.instances.iter().map(|i| i.port).collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.program.first().map_or(true, |p| p.trim().is_empty()) {
            bail!("program must name an executable");
        }

        if self.instances.is_empty() {
            bail!("at least one instance must be configured");
        }

        let mut seen = HashSet::new();
        for (idx, instance) in self.instances.iter().enumerate() {
            if instance.port == 0 {
                bail!("instance {} has port 0", idx);
            }
            if let Predecessor::Port(pred) = instance.predecessor {
                if !seen.contains(&pred) {
                    bail!(
                        "instance {} (port {}) points at predecessor {} which is not launched before it",
                        idx,
                        instance.port,
                        pred
                    );
                }
            }
            if !seen.insert(instance.port) {
                bail!("port {} is used by more than one instance", instance.port);
            }
        }

        if self.probe.value.is_empty() {
            bail!("probe value must not be empty");
        }

        if self.readiness.retry.max_attempts == 0 {
            bail!("readiness.retry.max_attempts must be at least 1");
        }

        Ok(())
    }
}

pub const NODE_BINARY: &str = "chain-node";

/// The `chain-node` built next to the running executable, falling back on
/// `cargo run` (which only works from the crate root and can take longer than
/// the launch delays on a cold build).
pub fn default_program() -> Vec<String> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().and_then(sibling_program))
        .unwrap_or_else(|| {
            ["cargo", "run", "--quiet", "--bin", NODE_BINARY, "--"]
                .into_iter()
                .map(String::from)
                .collect()
        })
}

fn sibling_program(dir: &Path) -> Option<Vec<String>> {
    let candidate = dir.join(format!("{}{}", NODE_BINARY, std::env::consts::EXE_SUFFIX));
    candidate
        .is_file()
        .then(|| vec![candidate.to_string_lossy().into_owned()])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceConfig {
    #[serde(default)]
    pub role: Role,
    pub port: u16,
    #[serde(default)]
    pub predecessor: Predecessor,
}

impl InstanceConfig {
    pub fn new(role: Role, port: u16, predecessor: Predecessor) -> Self {
        Self {
            role,
            port,
            predecessor,
        }
    }
}

/// Opt-in polling of each instance's health endpoint after the settle delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub enabled: bool,
    pub path: String,
    pub timeout_secs: u64,
    pub retry: RetryConfig,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "/health".to_string(),
            timeout_secs: 2,
            retry: RetryConfig::default(),
        }
    }
}

impl ReadinessConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff_base_ms: 100,
            backoff_max_ms: 1000,
        }
    }
}

impl RetryConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub value: String,
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8002,
            path: "/".to_string(),
            value: "d".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn url(&self) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!("http://{}:{}", self.host, self.port))?;
        url.set_path(&self.path);
        url.query_pairs_mut().append_pair("value", &self.value);
        Ok(url)
    }
}
