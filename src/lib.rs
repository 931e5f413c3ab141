// src/lib.rs
pub mod config;
pub mod harness;
pub mod health;
pub mod launcher;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod parent;
pub mod probe;
pub mod retry;
pub mod server;
