//! Synthetic resource stress: CPU, memory and URL load.
//!
//! This crate re-exports the three engines and the shared core, and hosts the
//! `stress-injector` command line.
//!
//! | Engine | Crate | Report |
//! |--------|-------|--------|
//! | CPU | [`cpu`] | cores ranked by peak utilization |
//! | Memory | [`memory`] | injected volume and peak resident memory |
//! | URL | [`url`] | success, error and abandoned call counts |
//!
//! # Example
//!
//! ```rust
//! use stress_injector::core::CancellationToken;
//! use stress_injector::memory::MemoryStress;
//!
//! let report = MemoryStress::builder()
//!     .megabytes(2)
//!     .build()?
//!     .run(&CancellationToken::new())?;
//! assert_eq!(report.blocks_allocated, 2);
//! # Ok::<(), stress_injector::core::StressError>(())
//! ```

pub use stress_injector_core as core;
pub use stress_injector_cpu as cpu;
pub use stress_injector_memory as memory;
pub use stress_injector_url as url;

pub mod cli;
