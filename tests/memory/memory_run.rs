use std::sync::{Arc, Mutex};
use stress_injector_core::{CancellationToken, ProgressSink, RunPhase};
use stress_injector_memory::{BLOCK_SIZE, MemoryStress, PeakMemoryProbe};

struct FixedProbe(Option<u64>);

impl PeakMemoryProbe for FixedProbe {
    fn peak_resident_bytes(&self) -> Option<u64> {
        self.0
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

#[derive(Default)]
struct Recorded {
    lines: Mutex<Vec<String>>,
    finished: Mutex<usize>,
}

impl ProgressSink for Recorded {
    fn update(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }

    fn finish(&self) {
        *self.finished.lock().unwrap() += 1;
    }
}

#[test]
fn allocates_every_requested_block() {
    let engine = MemoryStress::builder()
        .megabytes(4)
        .probe(FixedProbe(Some(3 * 1024 * 1024 * 1024)))
        .build()
        .unwrap();

    let report = engine.run(&CancellationToken::new()).unwrap();
    assert_eq!(report.requested_blocks, 4);
    assert_eq!(report.blocks_allocated, 4);
    assert_eq!(report.allocated_bytes(), 4 * BLOCK_SIZE as u64);
    assert!(!report.cancelled);
    assert_eq!(
        report.to_string(),
        "Stress Injected: 4 MB\nMemory Consumed: 3 GB"
    );
}

#[test]
fn unavailable_probe_is_reported_not_fatal() {
    let engine = MemoryStress::builder()
        .megabytes(1)
        .probe(FixedProbe(None))
        .build()
        .unwrap();

    let report = engine.run(&CancellationToken::new()).unwrap();
    assert_eq!(report.peak_resident_bytes, None);
    assert!(report.to_string().ends_with("Memory Consumed: unavailable on this host"));
}

#[test]
fn cancelled_before_start_allocates_nothing() {
    let token = CancellationToken::new();
    token.cancel();

    let engine = MemoryStress::builder()
        .megabytes(8)
        .probe(FixedProbe(Some(1024)))
        .build()
        .unwrap();

    let report = engine.run(&token).unwrap();
    assert!(report.cancelled);
    assert_eq!(report.blocks_allocated, 0);
    assert!(report.to_string().starts_with("Stress Injected: nothing"));
}

#[test]
fn cancelling_from_a_listener_stops_between_blocks() {
    let token = CancellationToken::new();
    let trigger = token.clone();

    let engine = MemoryStress::builder()
        .megabytes(50)
        .probe(FixedProbe(Some(1)))
        .on_block_allocated(move |allocated, _| {
            if allocated == 3 {
                trigger.cancel();
            }
        })
        .build()
        .unwrap();

    let report = engine.run(&token).unwrap();
    assert!(report.cancelled);
    assert_eq!(report.blocks_allocated, 3);
    assert_eq!(report.requested_blocks, 50);
}

#[test]
fn progress_is_reported_in_percent_steps() {
    let progress = Arc::new(Recorded::default());
    let engine = MemoryStress::builder()
        .megabytes(4)
        .probe(FixedProbe(None))
        .progress(progress.clone())
        .build()
        .unwrap();

    engine.run(&CancellationToken::new()).unwrap();

    let lines = progress.lines.lock().unwrap();
    assert_eq!(
        *lines,
        vec![
            "Generating random bytes: 25%",
            "Generating random bytes: 50%",
            "Generating random bytes: 75%",
            "Generating random bytes: 100%",
        ]
    );
    assert_eq!(*progress.finished.lock().unwrap(), 1);
}

#[test]
fn peak_and_phases_are_observed() {
    let peaks = Arc::new(Mutex::new(Vec::new()));
    let phases = Arc::new(Mutex::new(Vec::new()));
    let pk = Arc::clone(&peaks);
    let ph = Arc::clone(&phases);

    let engine = MemoryStress::builder()
        .megabytes(1)
        .probe(FixedProbe(Some(2048)))
        .on_peak_measured(move |peak| pk.lock().unwrap().push(peak))
        .on_phase_transition(move |_, to| ph.lock().unwrap().push(to))
        .build()
        .unwrap();

    engine.run(&CancellationToken::new()).unwrap();

    assert_eq!(*peaks.lock().unwrap(), vec![Some(2048)]);
    assert_eq!(
        *phases.lock().unwrap(),
        vec![
            RunPhase::Starting,
            RunPhase::Running,
            RunPhase::Stopping,
            RunPhase::Reporting,
            RunPhase::Idle
        ]
    );
}

#[test]
fn non_positive_volume_rejected() {
    assert!(MemoryStress::builder().build().is_err());
    assert!(MemoryStress::builder().gigabytes(0).build().is_err());
    assert!(
        MemoryStress::builder()
            .megabytes(0)
            .build()
            .err()
            .is_some_and(|e| e.is_invalid_input())
    );
}
