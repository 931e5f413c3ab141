// src/metrics/collector.rs
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Instant;
use anyhow::Result;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Result<Vec<u8>, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

/// How a lookup was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    LocalHit,
    ParentHit,
    Miss,
    Rejected,
    Failed,
}

impl LookupOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupOutcome::LocalHit => "local_hit",
            LookupOutcome::ParentHit => "parent_hit",
            LookupOutcome::Miss => "miss",
            LookupOutcome::Rejected => "rejected",
            LookupOutcome::Failed => "failed",
        }
    }
}

pub struct MetricsCollector {
    // Lookup metrics
    pub lookups_total: IntCounterVec,
    pub lookup_duration_seconds: HistogramVec,

    // Parent metrics
    pub parent_requests_total: IntCounterVec,
    pub parent_request_duration_seconds: HistogramVec,

    // Store
    pub store_entries: IntGauge,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let lookups_total = IntCounterVec::new(
            Opts::new("chain_lookups_total", "Total number of lookups"),
            &["outcome"],
        )?;
        registry.register(Box::new(lookups_total.clone()))?;

        let lookup_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "chain_lookup_duration_seconds",
                "Lookup duration in seconds",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(lookup_duration_seconds.clone()))?;

        let parent_requests_total = IntCounterVec::new(
            Opts::new("chain_parent_requests_total", "Lookups forwarded to the parent"),
            &["status"],
        )?;
        registry.register(Box::new(parent_requests_total.clone()))?;

        let parent_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "chain_parent_request_duration_seconds",
                "Parent request duration",
            ),
            &["status"],
        )?;
        registry.register(Box::new(parent_request_duration_seconds.clone()))?;

        let store_entries = IntGauge::new("chain_store_entries", "Entries in the local store")?;
        registry.register(Box::new(store_entries.clone()))?;

        Ok(Self {
            lookups_total,
            lookup_duration_seconds,
            parent_requests_total,
            parent_request_duration_seconds,
            store_entries,
        })
    }

    pub fn record_lookup(&self, outcome: LookupOutcome, duration: std::time::Duration) {
        self.lookups_total
            .with_label_values(&[outcome.as_str()])
            .inc();

        self.lookup_duration_seconds
            .with_label_values(&[outcome.as_str()])
            .observe(duration.as_secs_f64());
    }

    pub fn record_parent_request(&self, success: bool, duration: std::time::Duration) {
        let status = if success { "success" } else { "failure" };
        self.parent_requests_total
            .with_label_values(&[status])
            .inc();

        self.parent_request_duration_seconds
            .with_label_values(&[status])
            .observe(duration.as_secs_f64());
    }

    pub fn update_store_entries(&self, count: usize) {
        self.store_entries.set(count as i64);
    }
}

// Helper for timing operations
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
