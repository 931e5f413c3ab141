// src/health/checker.rs
use crate::config::ReadinessConfig;
use crate::retry::RetryStrategy;
use reqwest::Client;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::time::{timeout, Duration, Instant};
use tracing::{debug, info, warn};

/// Polls freshly launched nodes until their health endpoint answers.
pub struct ReadinessChecker {
    config: ReadinessConfig,
    host: String,
    client: Client,
    retry: RetryStrategy,
}

#[derive(Debug, Clone)]
pub struct ReadinessResult {
    pub port: u16,
    pub ready: bool,
    pub attempts: u32,
    pub elapsed_ms: u64,
    pub error: Option<String>,
}

impl ReadinessChecker {
    pub fn new(config: ReadinessConfig, host: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        let retry = RetryStrategy::new(config.retry.clone());

        Ok(Self {
            config,
            host: host.into(),
            client,
            retry,
        })
    }

    /// Wait on every port concurrently. Never fails; readiness is reported
    /// per port.
    pub async fn wait_all(&self, ports: &[u16]) -> Vec<ReadinessResult> {
        let checks = ports.iter().map(|port| self.wait_for(*port));
        let results = futures::future::join_all(checks).await;

        let ready = results.iter().filter(|r| r.ready).count();
        info!(
            "Readiness check complete: {} ready, {} not ready",
            ready,
            results.len() - ready
        );

        results
    }

    pub async fn wait_for(&self, port: u16) -> ReadinessResult {
        let start = Instant::now();
        let url = format!("http://{}:{}{}", self.host, port, self.config.path);
        let attempts = AtomicU32::new(0);

        let outcome = self
            .retry
            .execute(|| {
                attempts.fetch_add(1, Ordering::Relaxed);
                self.check_once(&url)
            })
            .await;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        let attempts = attempts.load(Ordering::Relaxed);

        match outcome {
            Ok(_) => {
                debug!(port, attempts, "instance is ready");
                ReadinessResult {
                    port,
                    ready: true,
                    attempts,
                    elapsed_ms,
                    error: None,
                }
            }
            Err(e) => {
                warn!(port, attempts, %e, "instance never became ready");
                ReadinessResult {
                    port,
                    ready: false,
                    attempts,
                    elapsed_ms,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn check_once(&self, url: &str) -> Result<(), String> {
        // Outer bound in case the client timeout is not hit (e.g. slow body).
        let limit = self.config.timeout() + Duration::from_millis(100);
        match timeout(limit, self.client.get(url).send()).await {
            Ok(Ok(response)) if response.status().is_success() => Ok(()),
            Ok(Ok(response)) => Err(format!("HTTP {}", response.status())),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err("Request timeout".to_string()),
        }
    }
}
