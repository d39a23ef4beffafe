use std::sync::{Arc, Mutex};
use std::time::Duration;
use stress_injector_core::{CancellationToken, RunPhase};
use stress_injector_cpu::CpuStress;

#[test]
fn listeners_observe_workers_samples_and_phases() {
    let started = Arc::new(Mutex::new(Vec::new()));
    let terminated = Arc::new(Mutex::new(Vec::new()));
    let samples = Arc::new(Mutex::new(Vec::new()));
    let phases = Arc::new(Mutex::new(Vec::new()));

    let s = Arc::clone(&started);
    let t = Arc::clone(&terminated);
    let sa = Arc::clone(&samples);
    let p = Arc::clone(&phases);

    let engine = CpuStress::builder()
        .duration(Duration::from_millis(60))
        .cores(2)
        .warmup(Duration::ZERO)
        .settle(Duration::ZERO)
        .sample_interval(Duration::from_millis(5))
        .termination_grace(Duration::from_secs(2))
        .utilization_source(|| || vec![12.5, 100.0])
        .on_worker_started(move |id| s.lock().unwrap().push(id))
        .on_worker_terminated(move |id, detached| t.lock().unwrap().push((id, detached)))
        .on_sample(move |percents| sa.lock().unwrap().push(percents.to_vec()))
        .on_phase_transition(move |_, to| p.lock().unwrap().push(to))
        .build()
        .unwrap();

    engine.run(&CancellationToken::new()).unwrap();

    let mut started = started.lock().unwrap().clone();
    started.sort_unstable();
    assert_eq!(started, vec![0, 1]);

    let mut terminated = terminated.lock().unwrap().clone();
    terminated.sort_unstable();
    assert_eq!(terminated, vec![(0, false), (1, false)]);

    let samples = samples.lock().unwrap();
    assert!(!samples.is_empty());
    assert!(samples.iter().all(|row| row == &vec![12.5, 100.0]));

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
    assert_eq!(engine.phase(), RunPhase::Idle);
}
