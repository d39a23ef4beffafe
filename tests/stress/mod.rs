//! Stress tests for the engines.
//!
//! ## What We Test
//!
//! - **Full volume**: A gigabyte of random blocks, tens of thousands of calls
//! - **Real cores**: Every logical core saturated for several seconds
//! - **Accounting**: Counts still add up at volume
//! - **Teardown**: No detached workers, no leaked permits

pub mod cpu;
pub mod memory;
pub mod url;

/// Routes engine logs to the test output; run with `--nocapture` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::INFO)
        .try_init();
}
