// ────────────────────────────────
// src/node/node.rs
// A single link of the chain: answers from its own store, falls back on
// its parent for keys it does not hold.
// ────────────────────────────────

use crate::metrics::{LookupOutcome, MetricsRegistry, Timer};
use crate::node::{Role, Store, FORWARDED_BY_HEADER, REQUEST_ID_HEADER};
use crate::parent::{ParentClient, ParentError};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

pub const HEALTH_PATH: &str = "/health";
pub const METRICS_PATH: &str = "/metrics";

/// Body of every successful lookup, at every depth of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResponse {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub struct ChainNode {
    role: Role,
    addr: SocketAddr,
    store: Arc<dyn Store>,
    parent: Option<ParentClient>,
    metrics: Option<Arc<MetricsRegistry>>,
    ready: AtomicBool,
}

impl ChainNode {
    pub fn new(
        role: Role,
        addr: SocketAddr,
        store: Arc<dyn Store>,
        parent: Option<ParentClient>,
    ) -> Self {
        Self {
            role,
            addr,
            store,
            parent,
            metrics: None,
            ready: AtomicBool::new(false),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The `host:port` this node reports as its `URL`.
    pub fn url(&self) -> String {
        self.addr.to_string()
    }

    pub fn parent(&self) -> Option<&ParentClient> {
        self.parent.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Seed the store with the role's entries. Lookups are refused until
    /// this has run.
    pub fn init(&self) {
        self.store.fill(self.role.prefill());

        if let Some(metrics) = &self.metrics {
            metrics.collector().update_store_entries(self.store.len());
        }

        self.ready.store(true, Ordering::Release);
        info!(
            role = %self.role,
            bucket = %self.store.bucket(),
            entries = self.store.len(),
            "node initialized"
        );
    }

    pub async fn handle(&self, req: Request<Body>) -> Result<Response<Body>, NodeError> {
        match req.uri().path() {
            HEALTH_PATH => return Ok(self.health()),
            METRICS_PATH if self.metrics.is_some() => return self.render_metrics(),
            _ => {}
        }

        let request_id = header_str(&req, REQUEST_ID_HEADER)
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let forwarded_by = header_str(&req, FORWARDED_BY_HEADER).map(str::to_string);
        let value = query_value(req.uri().query());

        let span = tracing::info_span!("lookup", request_id = %request_id, node = %self.addr);
        async move {
            match &forwarded_by {
                Some(child) => info!(value = ?value, from = %child, "lookup requested by child"),
                None => debug!(value = ?value, "lookup requested"),
            }

            let answer = self.lookup(value.as_deref(), &request_id).await?;

            let mut response = json_response(StatusCode::OK, &answer);
            if let Ok(id) = HeaderValue::from_str(&request_id) {
                response.headers_mut().insert(REQUEST_ID_HEADER, id);
            }
            Ok(response)
        }
        .instrument(span)
        .await
    }

    /// Resolve `value` locally, then through the parent chain.
    pub async fn lookup(
        &self,
        value: Option<&str>,
        request_id: &str,
    ) -> Result<LookupResponse, NodeError> {
        let timer = Timer::new();

        let value = match self.validate(value) {
            Ok(value) => value,
            Err(e) => {
                self.record(LookupOutcome::Rejected, &timer);
                return Err(e);
            }
        };

        if let Some(found) = self.store.get(value) {
            self.record(LookupOutcome::LocalHit, &timer);
            info!(value, found = %found, "responding from local store");
            return Ok(self.answer(found));
        }

        let Some(parent) = &self.parent else {
            self.record(LookupOutcome::Miss, &timer);
            info!(value, "key not found and no parent to ask");
            return Ok(self.answer(String::new()));
        };

        info!(value, parent = %parent.addr(), "requesting value from parent");
        let parent_timer = Timer::new();
        let result = parent.lookup(value, request_id, &self.url()).await;

        if let Some(metrics) = &self.metrics {
            metrics
                .collector()
                .record_parent_request(result.is_ok(), parent_timer.elapsed());
        }

        match result {
            Ok(found) if !found.is_empty() => {
                self.record(LookupOutcome::ParentHit, &timer);
                info!(value, found = %found, "responding with parent value");
                Ok(self.answer(found))
            }
            Ok(_) => {
                self.record(LookupOutcome::Miss, &timer);
                info!(value, "key not found anywhere up the chain");
                Ok(self.answer(String::new()))
            }
            Err(e) => {
                self.record(LookupOutcome::Failed, &timer);
                warn!(value, parent = %parent.addr(), %e, "parent lookup failed");
                Err(e.into())
            }
        }
    }

    fn validate<'a>(&self, value: Option<&'a str>) -> Result<&'a str, NodeError> {
        if !self.is_ready() {
            return Err(NodeError::NotReady);
        }

        let value = value.ok_or(NodeError::MissingValue)?;
        // One byte, so a single multi-byte character is rejected too.
        if value.len() != 1 {
            return Err(NodeError::InvalidValue(value.to_string()));
        }

        Ok(value)
    }

    fn answer(&self, value: String) -> LookupResponse {
        LookupResponse {
            url: self.url(),
            value,
        }
    }

    fn record(&self, outcome: LookupOutcome, timer: &Timer) {
        if let Some(metrics) = &self.metrics {
            metrics.collector().record_lookup(outcome, timer.elapsed());
        }
    }

    fn health(&self) -> Response<Body> {
        let (status, body) = if self.is_ready() {
            (StatusCode::OK, "OK")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "Starting")
        };

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        response
    }

    fn render_metrics(&self) -> Result<Response<Body>, NodeError> {
        let Some(registry) = &self.metrics else {
            return Ok(not_found());
        };

        let mut response = Response::new(Body::from(registry.gather()?));
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; version=0.0.4"),
        );
        Ok(response)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("request param `value` is missing")]
    MissingValue,

    #[error("request param `value` must be a single byte, got `{0}`")]
    InvalidValue(String),

    #[error("node is not initialized")]
    NotReady,

    #[error(transparent)]
    Parent(#[from] ParentError),

    #[error("failed to encode metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl NodeError {
    pub fn status(&self) -> StatusCode {
        match self {
            NodeError::MissingValue | NodeError::InvalidValue(_) => StatusCode::BAD_REQUEST,
            NodeError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            NodeError::Parent(ParentError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            NodeError::Parent(_) => StatusCode::BAD_GATEWAY,
            NodeError::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Convert NodeError to Hyper Response for error handling
impl From<NodeError> for Response<Body> {
    fn from(err: NodeError) -> Self {
        json_response(
            err.status(),
            &ErrorBody {
                error: err.to_string(),
            },
        )
    }
}

pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Body> {
    let bytes = serde_json::to_vec(body).unwrap_or_default();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn not_found() -> Response<Body> {
    let mut response = Response::new(Body::from("Not Found"));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

fn header_str<'a>(req: &'a Request<Body>, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// First `value` parameter of the query string, percent-decoded.
fn query_value(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "value")
        .map(|(_, value)| value.into_owned())
}
