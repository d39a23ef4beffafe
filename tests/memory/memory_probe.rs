use stress_injector_core::HostFamily;
use stress_injector_memory::{
    LINUX_SCALE, MACOS_SCALE, MemoryStress, PeakMemoryProbe, RusageProbe, probe_for,
};

#[test]
fn probe_follows_host_family() {
    assert_eq!(probe_for(HostFamily::Linux).name(), "getrusage");
    assert_eq!(probe_for(HostFamily::MacOs).name(), "getrusage");
    assert_eq!(probe_for(HostFamily::Windows).name(), "working-set");
    assert_eq!(probe_for(HostFamily::Unsupported).name(), "unavailable");
    assert_eq!(probe_for(HostFamily::Unsupported).peak_resident_bytes(), None);
}

#[test]
fn rusage_scales_differ_by_family() {
    assert_eq!(RusageProbe::macos().scale(), MACOS_SCALE);
    assert_eq!(RusageProbe::linux().scale(), LINUX_SCALE);
}

#[test]
fn builder_platform_selects_probe() {
    let engine = MemoryStress::builder()
        .megabytes(1)
        .platform(HostFamily::Windows)
        .build()
        .unwrap();
    assert_eq!(engine.config().probe_name(), "working-set");
}

#[cfg(unix)]
#[test]
fn rusage_reports_something_on_unix() {
    let peak = RusageProbe::linux().peak_resident_bytes();
    assert!(peak.is_some_and(|bytes| bytes > 0));
}
