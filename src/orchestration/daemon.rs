//! Container daemon abstraction
//!
//! The subset of the daemon's command interface packrun consumes. The
//! `docker` CLI implements it for real runs; tests substitute doubles that
//! record calls.

use crate::error::PackrunResult;
use crate::paths::{ContainerId, VolumeMap};
use async_trait::async_trait;

/// Abstract container daemon interface
#[async_trait]
pub trait ContainerDaemon: Send + Sync {
    /// Fail with `DaemonNotInstalled` when the daemon client is missing
    async fn ensure_installed(&self) -> PackrunResult<()>;

    /// Declared volume mounts of a running container
    async fn inspect_mounts(&self, id: &ContainerId) -> PackrunResult<VolumeMap>;

    /// Check if an image with this reference exists locally
    async fn image_exists(&self, image: &str) -> PackrunResult<bool>;

    /// Build an image from a tar build context and tag it
    ///
    /// `on_output` receives each line the daemon prints while building.
    async fn build_image(
        &self,
        tag: &str,
        labels: &[(String, String)],
        context: Vec<u8>,
        on_output: &(dyn Fn(String) + Send + Sync),
    ) -> PackrunResult<()>;

    /// Get the human-readable daemon name for display
    fn daemon_name(&self) -> &str;
}
