// src/node/mod.rs
mod node;
mod role;
mod store;

pub use node::{ChainNode, LookupResponse, NodeError, HEALTH_PATH, METRICS_PATH};
pub use role::{ParsePredecessorError, Predecessor, Role, NO_PREDECESSOR};
pub use store::{MemoryStore, Store};

/// Correlates one lookup across every node it passes through.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Address of the child that forwarded a lookup.
pub const FORWARDED_BY_HEADER: &str = "x-forwarded-by";
