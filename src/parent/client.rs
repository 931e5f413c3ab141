// ────────────────────────────────
// src/parent/client.rs
// Forwards lookups a node cannot answer to the node it is chained to.
// ────────────────────────────────

use crate::node::{LookupResponse, FORWARDED_BY_HEADER, REQUEST_ID_HEADER};
use reqwest::Client;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ParentClient {
    addr: SocketAddr,
    client: Client,
}

impl ParentClient {
    pub fn new(addr: SocketAddr, timeout: Duration) -> Result<Self, ParentError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ParentError::Client)?;

        Ok(Self { addr, client })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Ask the parent for `value`. An empty string means the parent (and
    /// everything above it) has no entry for the key.
    pub async fn lookup(
        &self,
        value: &str,
        request_id: &str,
        forwarded_by: &str,
    ) -> Result<String, ParentError> {
        let response = self
            .client
            .get(self.base_url())
            .query(&[("value", value)])
            .header(REQUEST_ID_HEADER, request_id)
            .header(FORWARDED_BY_HEADER, forwarded_by)
            .send()
            .await
            .map_err(ParentError::from_send)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ParentError::Status(status.as_u16()));
        }

        let body: LookupResponse = response.json().await.map_err(ParentError::Decode)?;
        debug!(parent = %self.addr, answered_by = %body.url, "parent answered");

        Ok(body.value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParentError {
    #[error("failed to build parent client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("parent unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("parent request timed out")]
    Timeout,

    #[error("parent answered with HTTP {0}")]
    Status(u16),

    #[error("parent sent an unreadable body: {0}")]
    Decode(#[source] reqwest::Error),
}

impl ParentError {
    fn from_send(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ParentError::Timeout
        } else {
            ParentError::Unreachable(err)
        }
    }
}
