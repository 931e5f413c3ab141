mod collector;

pub use collector::{LookupOutcome, MetricsCollector, MetricsRegistry, Timer};
