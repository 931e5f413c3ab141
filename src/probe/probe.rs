// ────────────────────────────────
// src/probe/probe.rs
// The single HTTP GET that checks the end of the chain.
// ────────────────────────────────

use crate::config::ProbeConfig;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Clone)]
pub struct Probe {
    url: Url,
    client: Client,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub lines: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("invalid probe url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("could not reach {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {0} timed out")]
    Timeout(String),

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
}

impl Probe {
    pub fn new(config: &ProbeConfig) -> Result<Self, ProbeError> {
        let url = config.url()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ProbeError::Client)?;

        Ok(Self { url, client })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Issue the request once. Non-2xx statuses are errors; the body is
    /// only read on success.
    pub async fn fire(&self) -> Result<ProbeResponse, ProbeError> {
        info!(url = %self.url, "probing");

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status {
                url: self.url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout(self.url.to_string())
            } else {
                ProbeError::Body(e)
            }
        })?;

        let lines: Vec<String> = body.lines().map(str::to_string).collect();
        debug!(status = status.as_u16(), lines = lines.len(), "probe answered");

        Ok(ProbeResponse {
            status: status.as_u16(),
            lines,
        })
    }

    fn classify(&self, err: reqwest::Error) -> ProbeError {
        if err.is_timeout() {
            ProbeError::Timeout(self.url.to_string())
        } else {
            ProbeError::Connect {
                url: self.url.to_string(),
                source: err,
            }
        }
    }
}
