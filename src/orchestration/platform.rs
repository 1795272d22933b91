//! Host platform detection
//!
//! The platform decides how host paths reach the daemon and which identity
//! owns files created in the container.

use std::fmt;

/// Detected platform of the invoking host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Linux - the daemon shares our filesystem namespace (or our parent's)
    Linux,
    /// macOS - the daemon runs inside a VM with the host filesystem shared in
    MacOS,
    /// Windows - the daemon runs inside a VM, drives mounted as `/c`, `/d`, ...
    Windows,
    /// Anything else, treated like the VM-hosted platforms
    Other,
}

impl Platform {
    /// Detect the current platform
    pub fn detect() -> Self {
        match std::env::consts::OS {
            "linux" => Platform::Linux,
            "macos" => Platform::MacOS,
            "windows" => Platform::Windows,
            _ => Platform::Other,
        }
    }

    /// Whether the daemon can see host paths without VM translation
    pub fn is_linux(&self) -> bool {
        matches!(self, Platform::Linux)
    }

    /// Get a human-readable platform name
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::MacOS => "macOS",
            Platform::Windows => "Windows",
            Platform::Other => "Other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
