//! CPU engine stress tests

use std::time::{Duration, Instant};
use stress_injector_core::CancellationToken;
use stress_injector_cpu::{CpuStress, logical_cores};

/// Test: Every logical core for three seconds with the real sampler
#[test]
#[ignore]
fn stress_all_cores() {
    super::init_tracing();
    let cores = logical_cores();
    let engine = CpuStress::builder()
        .seconds(3)
        .warmup(Duration::from_millis(500))
        .settle(Duration::from_millis(500))
        .build()
        .unwrap();

    let start = Instant::now();
    let report = engine.run(&CancellationToken::new()).unwrap();
    let elapsed = start.elapsed();

    println!("{report}");
    println!("Elapsed: {elapsed:?}");

    assert_eq!(report.workers_started, cores);
    assert_eq!(report.workers_detached, 0);
    assert_eq!(report.utilization.ranking().len(), cores);
    assert!(report.samples >= 3);
    let busiest = report.utilization.ranking()[0].percent;
    assert!(busiest > 50.0, "busiest core only reached {busiest}%");
}

/// Test: A long run with a tiny sample log keeps memory bounded
#[test]
#[ignore]
fn stress_sample_log_compaction() {
    let engine = CpuStress::builder()
        .seconds(2)
        .cores(1)
        .warmup(Duration::ZERO)
        .settle(Duration::ZERO)
        .sample_interval(Duration::from_millis(1))
        .sample_capacity(16)
        .utilization_source(|| {
            let mut tick = 0u32;
            move || {
                tick += 1;
                vec![(tick % 100) as f32]
            }
        })
        .build()
        .unwrap();

    let report = engine.run(&CancellationToken::new()).unwrap();
    assert!(report.samples <= 16);
    assert_eq!(report.utilization.ranking()[0].percent, 99.0);
}
