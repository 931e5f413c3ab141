mod client;

pub use client::{ParentClient, ParentError};
