// src/health/mod.rs
mod checker;

pub use checker::{ReadinessChecker, ReadinessResult};
