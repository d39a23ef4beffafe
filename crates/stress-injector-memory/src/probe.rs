//! Peak resident memory probes, one per host family.
//!
//! The strategy is picked once by [`probe_for`]; the controller only sees the
//! [`PeakMemoryProbe`] trait.

use std::sync::Arc;
use stress_injector_core::HostFamily;
use sysinfo::{Pid, ProcessesToUpdate, System};

/// Reads the peak resident memory of the current process.
pub trait PeakMemoryProbe: Send + Sync {
    /// Peak resident bytes, or `None` when the host cannot report it.
    fn peak_resident_bytes(&self) -> Option<u64>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Shared, type-erased probe.
pub type SharedProbe = Arc<dyn PeakMemoryProbe>;

/// `ru_maxrss` is already in bytes on macOS.
pub const MACOS_SCALE: u64 = 1;

/// `ru_maxrss` is in kilobytes on Linux. Multiplied by 1000, not 1024, to
/// stay consistent with the reports this tool has always produced.
pub const LINUX_SCALE: u64 = 1000;

/// Probe backed by `getrusage(RUSAGE_SELF)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RusageProbe {
    scale: u64,
}

impl RusageProbe {
    /// Creates a probe multiplying `ru_maxrss` by `scale`.
    pub fn with_scale(scale: u64) -> Self {
        Self { scale }
    }

    /// Probe for macOS hosts.
    pub fn macos() -> Self {
        Self::with_scale(MACOS_SCALE)
    }

    /// Probe for Linux hosts.
    pub fn linux() -> Self {
        Self::with_scale(LINUX_SCALE)
    }

    /// Scale factor applied to `ru_maxrss`.
    pub fn scale(&self) -> u64 {
        self.scale
    }
}

impl PeakMemoryProbe for RusageProbe {
    #[cfg(unix)]
    fn peak_resident_bytes(&self) -> Option<u64> {
        // SAFETY: rusage is plain data and getrusage only writes into it.
        let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
        if rc != 0 {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                error = %std::io::Error::last_os_error(),
                "getrusage failed"
            );
            return None;
        }
        u64::try_from(usage.ru_maxrss)
            .ok()
            .map(|peak| peak.saturating_mul(self.scale))
    }

    #[cfg(not(unix))]
    fn peak_resident_bytes(&self) -> Option<u64> {
        None
    }

    fn name(&self) -> &'static str {
        "getrusage"
    }
}

/// Probe backed by the process table, used on Windows.
///
/// Reports the resident working set of the current process at the time of the
/// query. After a retained allocation this equals the peak.
#[derive(Debug, Clone, Copy)]
pub struct WorkingSetProbe {
    pid: u32,
}

impl WorkingSetProbe {
    /// Probe for the process with id `pid`.
    pub fn new(pid: u32) -> Self {
        Self { pid }
    }

    /// Probe for the current process.
    pub fn current() -> Self {
        Self::new(std::process::id())
    }
}

impl PeakMemoryProbe for WorkingSetProbe {
    fn peak_resident_bytes(&self) -> Option<u64> {
        let pid = Pid::from_u32(self.pid);
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        system.process(pid).map(|process| process.memory())
    }

    fn name(&self) -> &'static str {
        "working-set"
    }
}

/// Probe for hosts that cannot report peak memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableProbe;

impl PeakMemoryProbe for UnavailableProbe {
    fn peak_resident_bytes(&self) -> Option<u64> {
        None
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

/// Selects the probe for a host family.
pub fn probe_for(family: HostFamily) -> SharedProbe {
    match family {
        HostFamily::MacOs => Arc::new(RusageProbe::macos()),
        HostFamily::Linux => Arc::new(RusageProbe::linux()),
        HostFamily::Windows => Arc::new(WorkingSetProbe::current()),
        HostFamily::Unsupported => Arc::new(UnavailableProbe),
    }
}
