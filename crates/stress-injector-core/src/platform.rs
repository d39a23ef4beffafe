//! Host platform detection.
//!
//! Controllers that depend on OS-specific facilities (the peak memory probe)
//! select their strategy once from [`HostFamily`]. Detection fails fast for
//! hosts outside the supported set, before any engine is constructed.

use crate::error::StressError;
use std::fmt;

/// Operating system family of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HostFamily {
    /// Apple macOS (Darwin).
    MacOs,
    /// Linux.
    Linux,
    /// Microsoft Windows.
    Windows,
    /// Anything else.
    Unsupported,
}

impl HostFamily {
    /// Returns the family of the host this binary was compiled for.
    pub fn current() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Maps an OS name as reported by `std::env::consts::OS` (or the
    /// `uname`-style `Darwin`) to a family.
    pub fn from_os_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "macos" | "darwin" => HostFamily::MacOs,
            "linux" => HostFamily::Linux,
            "windows" => HostFamily::Windows,
            _ => HostFamily::Unsupported,
        }
    }

    /// Returns `true` for macOS, Linux and Windows.
    pub fn is_supported(&self) -> bool {
        !matches!(self, HostFamily::Unsupported)
    }
}

impl fmt::Display for HostFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HostFamily::MacOs => "macOS",
            HostFamily::Linux => "Linux",
            HostFamily::Windows => "Windows",
            HostFamily::Unsupported => "Unsupported",
        })
    }
}

/// Facts about the current process and host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformProbe {
    family: HostFamily,
    os_name: String,
    pid: u32,
}

impl PlatformProbe {
    /// Detects the host, failing with [`StressError::UnsupportedPlatform`]
    /// when it is outside the supported set.
    pub fn detect() -> Result<Self, StressError> {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Builds a probe for a named OS with the current process id.
    pub fn from_os_name(os_name: &str) -> Result<Self, StressError> {
        let family = HostFamily::from_os_name(os_name);
        if !family.is_supported() {
            return Err(StressError::UnsupportedPlatform {
                os: os_name.to_string(),
            });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(os = os_name, %family, pid = std::process::id(), "Detected host platform");

        Ok(Self {
            family,
            os_name: os_name.to_string(),
            pid: std::process::id(),
        })
    }

    /// Returns the host family.
    pub fn family(&self) -> HostFamily {
        self.family
    }

    /// Returns the OS name that was detected.
    pub fn os_name(&self) -> &str {
        &self.os_name
    }

    /// Returns the id of the current process.
    pub fn pid(&self) -> u32 {
        self.pid
    }
}
