//! Integration tests for the CPU engine.
//!
//! Test organization:
//! - cpu_run.rs: Full runs against scripted utilization sources
//! - cpu_config.rs: Builder validation and defaults
//! - cpu_events.rs: Event listener wiring

mod cpu_config;
mod cpu_events;
mod cpu_run;
