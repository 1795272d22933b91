//! Path resolution rules
//!
//! 1. Non-Linux host: syntactic rewrite for the daemon's VM.
//! 2. Linux, not in a container: unchanged.
//! 3. Linux, in a container: rewrite through the container's declared mounts.

use crate::error::PackrunResult;
use crate::orchestration::{ContainerDaemon, Platform};
use crate::paths::{normalize_lexically, ContainerId, DaemonPath, VolumeMap};
use std::path::Path;
use tokio::sync::OnceCell;
use tracing::debug;

/// Rewrite a host path for a daemon running inside a VM.
///
/// `C:\Users\me\proj` becomes `/c/Users/me/proj`; paths without a drive
/// letter keep their segments with separators normalised. The VM is assumed
/// to mount host drives this way; nothing verifies it.
pub fn translate_foreign_path(path: &str) -> DaemonPath {
    let bytes = path.as_bytes();
    let (drive, rest) = if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
    {
        (Some(bytes[0].to_ascii_lowercase() as char), &path[2..])
    } else {
        (None, path)
    };

    let mut out = String::with_capacity(path.len() + 1);
    if let Some(drive) = drive {
        out.push('/');
        out.push(drive);
    }
    for segment in rest.split(['\\', '/']).filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    DaemonPath::new(out)
}

/// Resolves host paths to daemon paths for one invocation.
///
/// The container's mounts are inspected on first use and reused for every
/// later path.
pub struct PathResolver<'a> {
    platform: Platform,
    container: Option<ContainerId>,
    daemon: &'a dyn ContainerDaemon,
    volumes: OnceCell<VolumeMap>,
}

impl<'a> PathResolver<'a> {
    pub fn new(
        platform: Platform,
        container: Option<ContainerId>,
        daemon: &'a dyn ContainerDaemon,
    ) -> Self {
        Self {
            platform,
            container,
            daemon,
            volumes: OnceCell::new(),
        }
    }

    /// Container packrun is running in, if any
    pub fn container(&self) -> Option<&ContainerId> {
        self.container.as_ref()
    }

    /// Path to hand to the daemon's `-v` flag for `host_path`
    pub async fn resolve(&self, host_path: &Path) -> PackrunResult<DaemonPath> {
        if !self.platform.is_linux() {
            let resolved = translate_foreign_path(&host_path.to_string_lossy());
            debug!(
                "{} host: {} -> {}",
                self.platform,
                host_path.display(),
                resolved
            );
            return Ok(resolved);
        }

        let Some(ref id) = self.container else {
            return Ok(DaemonPath::new(
                normalize_lexically(host_path).to_string_lossy(),
            ));
        };

        let volumes = self
            .volumes
            .get_or_try_init(|| self.daemon.inspect_mounts(id))
            .await?;
        let resolved = volumes.resolve(host_path)?;
        debug!(
            "Container {}: {} -> {}",
            id.short(),
            host_path.display(),
            resolved
        );
        Ok(resolved)
    }
}
