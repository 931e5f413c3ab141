mod strategy;

pub use strategy::{Attempted, RetryError, RetryStrategy};
