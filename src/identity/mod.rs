//! Identity remapping
//!
//! Files the containerized command creates in the project mount must end
//! up owned by the invoking host user. The built-in `pack` account is
//! rewritten to the host's numeric ids before the command runs.

mod bootstrap;

pub use bootstrap::{BootstrapScript, BOOTSTRAP_ARG0};

use crate::orchestration::Platform;
use std::fmt;

/// Identity used on hosts where the daemon lives in a VM.
///
/// Host ids mean nothing behind the VM's file-sharing layer, so every run
/// uses this pair to keep ownership stable across runs.
pub const SURROGATE_IDENTITY: Identity = Identity {
    uid: 1000,
    gid: 1000,
};

/// Numeric owner for files created by the containerized command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub uid: u32,
    pub gid: u32,
}

impl Identity {
    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// Resolve the identity for the current invocation
    pub fn detect(platform: Platform) -> Self {
        if platform.is_linux() {
            Self::current_process()
        } else {
            SURROGATE_IDENTITY
        }
    }

    #[cfg(unix)]
    fn current_process() -> Self {
        // SAFETY: getuid/getgid cannot fail and touch no memory
        let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
        Self { uid, gid }
    }

    #[cfg(not(unix))]
    fn current_process() -> Self {
        SURROGATE_IDENTITY
    }

    /// Whether this is the root account
    pub fn is_root(&self) -> bool {
        self.uid == 0 && self.gid == 0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.uid, self.gid)
    }
}

/// Name of the invoking user, safe for use in a volume name
pub fn invoking_user_name(identity: Identity) -> String {
    let raw = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default();
    sanitize_user_name(&raw).unwrap_or_else(|| format!("uid{}", identity.uid))
}

fn sanitize_user_name(raw: &str) -> Option<String> {
    let name: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() || name.chars().all(|c| c == '_') {
        None
    } else {
        Some(name)
    }
}
