//! Memory engine stress tests

use std::time::Instant;
use stress_injector_core::CancellationToken;
use stress_injector_memory::{BLOCKS_PER_GIGABYTE, MemoryStress, UnavailableProbe};

/// Test: One gigabyte of random blocks
#[test]
#[ignore]
fn stress_one_gigabyte() {
    super::init_tracing();
    let engine = MemoryStress::builder().gigabytes(1).build().unwrap();

    let start = Instant::now();
    let report = engine.run(&CancellationToken::new()).unwrap();
    println!("{report}");
    println!("Elapsed: {:?}", start.elapsed());

    assert_eq!(report.blocks_allocated, BLOCKS_PER_GIGABYTE);
    assert_eq!(report.injected().as_deref(), Some("1 GB"));
    if let Some(peak) = report.peak_resident_bytes {
        assert!(peak >= report.allocated_bytes() / 2, "peak {peak} below half the volume");
    }
}

/// Test: One gigabyte on a host with no peak memory reading
#[test]
#[ignore]
fn stress_one_gigabyte_without_peak_reading() {
    super::init_tracing();
    let engine = MemoryStress::builder()
        .gigabytes(1)
        .probe(UnavailableProbe)
        .build()
        .unwrap();

    let report = engine.run(&CancellationToken::new()).unwrap();
    println!("{report}");

    assert_eq!(report.blocks_allocated, BLOCKS_PER_GIGABYTE);
    assert_eq!(report.peak_resident_bytes, None);
    assert_eq!(report.injected().as_deref(), Some("1 GB"));
}
