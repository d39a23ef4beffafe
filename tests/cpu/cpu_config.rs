use std::time::Duration;
use stress_injector_cpu::CpuStress;

#[test]
fn zero_seconds_rejected() {
    let err = CpuStress::builder().seconds(0).build().err().unwrap();
    assert!(err.is_invalid_input());
    assert!(err.to_string().contains("seconds"));
}

#[test]
fn zero_cores_rejected() {
    let err = CpuStress::builder().seconds(1).cores(0).build().err().unwrap();
    assert!(err.is_invalid_input());
}

#[test]
fn zero_interval_rejected() {
    let result = CpuStress::builder()
        .seconds(1)
        .sample_interval(Duration::ZERO)
        .build();
    assert!(result.is_err());
}

#[test]
fn seconds_sets_duration() {
    let engine = CpuStress::builder().seconds(7).build().unwrap();
    assert_eq!(engine.config().duration(), Duration::from_secs(7));
}
