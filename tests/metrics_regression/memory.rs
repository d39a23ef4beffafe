//! Memory engine metrics regression tests

use super::helpers::*;
use serial_test::serial;
use stress_injector_core::CancellationToken;
use stress_injector_memory::{MemoryStress, PeakMemoryProbe};

struct FixedProbe;

impl PeakMemoryProbe for FixedProbe {
    fn peak_resident_bytes(&self) -> Option<u64> {
        Some(4096)
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

#[test]
#[serial]
fn memory_metrics_exist() {
    init_recorder();

    let engine = MemoryStress::builder()
        .name("test_memory")
        .megabytes(2)
        .probe(FixedProbe)
        .build()
        .unwrap();
    engine.run(&CancellationToken::new()).unwrap();

    assert_counter_exists("memory_blocks_allocated_total");
    assert_gauge_exists("memory_peak_resident_bytes");
    assert_metric_has_label("memory_blocks_allocated_total", "engine", "test_memory");
}
