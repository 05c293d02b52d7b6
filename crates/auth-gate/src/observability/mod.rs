//! Observability for the gate.
//!
//! Provides metrics definitions and the Prometheus recorder setup.

pub mod metrics;
