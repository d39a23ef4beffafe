use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use stress_injector_core::CancellationToken;
use stress_injector_cpu::{CorePeak, CpuStress, CpuStressConfigBuilder, UtilizationReport};

fn fast(cores: usize) -> CpuStressConfigBuilder {
    CpuStress::builder()
        .duration(Duration::from_millis(80))
        .cores(cores)
        .warmup(Duration::ZERO)
        .settle(Duration::ZERO)
        .sample_interval(Duration::from_millis(5))
        .termination_grace(Duration::from_secs(2))
}

#[test]
fn peaks_are_ranked_descending() {
    let engine = fast(3)
        .utilization_source(|| {
            let mut tick = 0usize;
            move || {
                tick += 1;
                match tick % 3 {
                    0 => vec![20.0, 55.0, 99.5],
                    1 => vec![80.0, 10.0, 40.0],
                    _ => vec![5.0, 60.0, 1.0],
                }
            }
        })
        .build()
        .unwrap();

    let report = engine.run(&CancellationToken::new()).unwrap();
    let ranking = report.utilization.ranking();

    assert!(report.samples >= 3, "expected several samples, got {}", report.samples);
    assert_eq!(
        ranking,
        &[
            CorePeak { core: 2, percent: 99.5 },
            CorePeak { core: 0, percent: 80.0 },
            CorePeak { core: 1, percent: 60.0 },
        ]
    );
}

#[test]
fn every_worker_is_accounted_for() {
    let engine = fast(4)
        .utilization_source(|| || vec![100.0; 4])
        .build()
        .unwrap();

    let report = engine.run(&CancellationToken::new()).unwrap();
    assert_eq!(report.workers_started, 4);
    assert_eq!(report.workers_detached, 0);
    assert!(!report.cancelled);
}

#[test]
fn cancel_during_warmup_reports_stopped() {
    let engine = CpuStress::builder()
        .duration(Duration::from_secs(30))
        .cores(2)
        .warmup(Duration::from_secs(30))
        .sample_interval(Duration::from_millis(5))
        .utilization_source(|| || vec![0.0, 0.0])
        .build()
        .unwrap();

    let token = CancellationToken::new();
    let trigger = token.clone();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        trigger.cancel();
    });

    let report = engine.run(&token).unwrap();
    canceller.join().unwrap();

    assert!(report.cancelled);
    assert_eq!(report.workers_started, 0);
    assert_eq!(report.utilization, UtilizationReport::StoppedBeforeMeasurement);
    assert_eq!(
        report.utilization.to_string(),
        "Stress Test was stopped before it began."
    );
}

#[test]
fn cancel_during_load_still_ranks() {
    let polls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&polls);
    let engine = CpuStress::builder()
        .duration(Duration::from_secs(30))
        .cores(2)
        .warmup(Duration::ZERO)
        .settle(Duration::ZERO)
        .sample_interval(Duration::from_millis(5))
        .termination_grace(Duration::from_secs(2))
        .utilization_source(move || {
            let counted = Arc::clone(&counted);
            move || {
                counted.fetch_add(1, Ordering::SeqCst);
                vec![50.0, 75.0]
            }
        })
        .build()
        .unwrap();

    let token = CancellationToken::new();
    let trigger = token.clone();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        trigger.cancel();
    });

    let report = engine.run(&token).unwrap();
    canceller.join().unwrap();

    assert!(report.cancelled);
    assert!(report.load_runtime.is_some_and(|d| d < Duration::from_secs(30)));
    assert_eq!(report.workers_started, 2);
    assert!(polls.load(Ordering::SeqCst) > 0);
    assert_eq!(report.utilization.ranking()[0], CorePeak { core: 1, percent: 75.0 });
}

#[test]
fn engine_can_run_twice() {
    let engine = fast(1)
        .utilization_source(|| || vec![42.0])
        .build()
        .unwrap();

    let first = engine.run(&CancellationToken::new()).unwrap();
    let second = engine.run(&CancellationToken::new()).unwrap();
    assert_eq!(first.utilization, second.utilization);
}
