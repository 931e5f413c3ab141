mod probe;

pub use probe::{Probe, ProbeError, ProbeResponse};
