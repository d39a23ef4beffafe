//! Integration tests for the memory engine.
//!
//! Test organization:
//! - memory_run.rs: Allocation runs, cancellation, and reporting
//! - memory_probe.rs: Probe selection and scaling

mod memory_probe;
mod memory_run;
