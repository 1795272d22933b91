//! Self-containment detection
//!
//! Works out whether packrun itself runs inside a container, and which one,
//! by scraping the control-group membership of the current process.

use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::debug;

/// Control-group membership record of the current process
pub const PROC_SELF_CGROUP: &str = "/proc/self/cgroup";

/// 64-hex-digit container instance identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(String);

impl ContainerId {
    /// Validate and wrap an identifier
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            Some(Self(s.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 characters, as the daemon displays them
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Answers "is this process inside a container, and which one?"
pub trait ContainmentProbe: Send + Sync {
    fn detect(&self) -> Option<ContainerId>;
}

/// Probe backed by `/proc/self/cgroup`
#[derive(Debug, Clone)]
pub struct CgroupProbe {
    path: PathBuf,
}

impl CgroupProbe {
    /// Probe the current process
    pub fn new() -> Self {
        Self::with_path(PROC_SELF_CGROUP)
    }

    /// Probe an arbitrary cgroup record (for tests)
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for CgroupProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainmentProbe for CgroupProbe {
    fn detect(&self) -> Option<ContainerId> {
        // Unreadable means not Linux or a locked-down sandbox: not contained
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("Cannot read {}: {}", self.path.display(), e);
                return None;
            }
        };

        let id = find_container_id(&content);
        match id {
            Some(ref id) => debug!("Running inside container {}", id.short()),
            None => debug!("Not running inside a container"),
        }
        id
    }
}

/// Probe returning an injected answer
#[derive(Debug, Clone, Default)]
pub struct FixedProbe(Option<ContainerId>);

impl FixedProbe {
    pub fn new(id: Option<ContainerId>) -> Self {
        Self(id)
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl ContainmentProbe for FixedProbe {
    fn detect(&self) -> Option<ContainerId> {
        self.0.clone()
    }
}

fn id_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // cgroup v1 path segment: 12:memory:/docker/<id>
            Regex::new(r"/([0-9a-f]{64})(?:/|$)").expect("static regex"),
            // systemd scope unit: 0::/system.slice/docker-<id>.scope
            Regex::new(r"-([0-9a-f]{64})\.scope(?:/|$)").expect("static regex"),
        ]
    })
}

/// Scan a cgroup record for the first container identifier
pub fn find_container_id(cgroup: &str) -> Option<ContainerId> {
    cgroup.lines().find_map(|line| {
        let path = line.splitn(3, ':').nth(2).unwrap_or(line).trim_end();
        id_patterns()
            .iter()
            .find_map(|re| re.captures(path))
            .and_then(|caps| ContainerId::parse(&caps[1]))
    })
}
