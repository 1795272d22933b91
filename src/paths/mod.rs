//! Host path to daemon path resolution
//!
//! The daemon that will mount the project may not see the filesystem the
//! way packrun does: it can live in a VM (macOS, Windows) or be the parent
//! daemon of the container packrun itself runs in. This module works out
//! the path string the daemon needs for a given host path.

mod containment;
mod resolve;

pub use containment::{CgroupProbe, ContainerId, ContainmentProbe, FixedProbe};
pub use resolve::{translate_foreign_path, PathResolver};

use crate::error::{PackrunError, PackrunResult};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A path as understood by the daemon's mount subsystem
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DaemonPath(String);

impl DaemonPath {
    /// Wrap an already-resolved POSIX path
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Borrow as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DaemonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One declared mount of the current container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    destination: String,
    source: String,
}

impl VolumeMount {
    /// Mount of host `source` at container `destination`
    pub fn new(destination: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            source: source.into(),
        }
    }

    /// Mount point inside the current container
    #[cfg(test)]
    pub(crate) fn destination(&self) -> &str {
        &self.destination
    }

    /// Host-side path backing the mount
    #[cfg(test)]
    pub(crate) fn source(&self) -> &str {
        &self.source
    }
}

/// Mounts the parent daemon declared for the current container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeMap {
    mounts: Vec<VolumeMount>,
}

impl VolumeMap {
    /// Create from inspected mounts, in daemon order
    pub fn new(mounts: Vec<VolumeMount>) -> Self {
        Self { mounts }
    }

    #[cfg(test)]
    pub(crate) fn mounts(&self) -> &[VolumeMount] {
        &self.mounts
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// Rewrite `path` through the most specific mount containing it.
    ///
    /// Ancestry is component-wise, so `/a` contains `/a/b` but not `/ab`.
    /// `..` is folded first, so `/work/../etc` is `/etc`. Two different
    /// sources declared for the winning mount point are an error rather
    /// than a guess.
    pub fn resolve(&self, path: &Path) -> PackrunResult<DaemonPath> {
        let normalized = normalize_lexically(path);
        let path = normalized.as_path();
        let mut best: Option<(&VolumeMount, usize, &Path)> = None;
        let mut conflict: Option<&VolumeMount> = None;

        for mount in &self.mounts {
            let destination = Path::new(&mount.destination);
            let Ok(rest) = path.strip_prefix(destination) else {
                continue;
            };
            let depth = destination.components().count();

            match best {
                Some((_, current_depth, _)) if depth < current_depth => {}
                Some((current, current_depth, _)) if depth == current_depth => {
                    if current.source != mount.source && conflict.is_none() {
                        conflict = Some(mount);
                    }
                }
                _ => {
                    best = Some((mount, depth, rest));
                    conflict = None;
                }
            }
        }

        let (mount, _, rest) = best.ok_or_else(|| PackrunError::PathNotInVolume {
            path: path.to_path_buf(),
        })?;

        if let Some(other) = conflict {
            return Err(PackrunError::AmbiguousMount {
                path: path.to_path_buf(),
                destination: mount.destination.clone(),
                first: mount.source.clone(),
                second: other.source.clone(),
            });
        }

        Ok(DaemonPath(join_posix(&mount.source, rest)))
    }
}

/// Fold `.` and `..` without touching the filesystem.
///
/// `..` at the root stays at the root, as the kernel does.
pub(crate) fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

/// Append the components of `rest` to a POSIX `base` path
fn join_posix(base: &str, rest: &Path) -> String {
    let mut joined = base.trim_end_matches('/').to_string();
    for component in rest.components() {
        if let Component::Normal(part) = component {
            joined.push('/');
            joined.push_str(&part.to_string_lossy());
        }
    }
    if joined.is_empty() {
        joined.push('/');
    }
    joined
}
