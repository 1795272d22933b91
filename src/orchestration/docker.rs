//! Docker CLI daemon client
//!
//! Implements the ContainerDaemon trait by shelling out to the `docker`
//! binary (or whatever `PACKRUN_DOCKER` points at).

use crate::error::{PackrunError, PackrunResult};
use crate::orchestration::daemon::ContainerDaemon;
use crate::orchestration::stream_child_output;
use crate::paths::{ContainerId, VolumeMap, VolumeMount};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

/// One element of the array printed by `docker inspect <container>`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectEntry {
    #[serde(default)]
    mounts: Vec<InspectMount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectMount {
    source: String,
    destination: String,
}

/// Parse the mount declarations out of `docker inspect` output
pub fn parse_inspect_mounts(id: &str, json: &[u8]) -> PackrunResult<VolumeMap> {
    let entries: Vec<InspectEntry> =
        serde_json::from_slice(json).map_err(|e| PackrunError::DaemonMetadata {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| PackrunError::DaemonMetadata {
            id: id.to_string(),
            reason: "inspect returned no entries".to_string(),
        })?;

    let mut mounts = Vec::with_capacity(entry.mounts.len());
    for mount in entry.mounts {
        if !mount.destination.starts_with('/') {
            return Err(PackrunError::DaemonMetadata {
                id: id.to_string(),
                reason: format!("mount destination is not absolute: {}", mount.destination),
            });
        }
        mounts.push(VolumeMount::new(mount.destination, mount.source));
    }

    Ok(VolumeMap::new(mounts))
}

/// Whether `inspect` stderr reports an absent image.
///
/// Docker says "No such image", Podman "image not known".
fn is_missing_image(stderr: &str) -> bool {
    let stderr = stderr.to_ascii_lowercase();
    ["no such image", "no such object", "image not known"]
        .iter()
        .any(|marker| stderr.contains(marker))
}

/// Container daemon reached through the docker command line
pub struct DockerCli {
    binary: PathBuf,
}

impl DockerCli {
    /// Create a client for the given docker-compatible binary
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.binary.display(), args.join(" "))
    }

    /// Execute a docker command and return the output
    async fn exec(&self, args: &[&str]) -> PackrunResult<std::process::Output> {
        debug!("Executing: {}", self.describe(args));

        Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| PackrunError::command_failed(self.describe(args), e))
    }
}

#[async_trait]
impl ContainerDaemon for DockerCli {
    async fn ensure_installed(&self) -> PackrunResult<()> {
        let output = self.exec(&["--version"]).await?;
        if output.status.success() {
            debug!(
                "Daemon client: {}",
                String::from_utf8_lossy(&output.stdout).trim()
            );
            Ok(())
        } else {
            Err(PackrunError::DaemonNotInstalled(
                self.binary.display().to_string(),
            ))
        }
    }

    async fn inspect_mounts(&self, id: &ContainerId) -> PackrunResult<VolumeMap> {
        let output = self.exec(&["inspect", id.as_str()]).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PackrunError::DaemonMetadata {
                id: id.to_string(),
                reason: stderr.trim().to_string(),
            });
        }

        let volumes = parse_inspect_mounts(id.as_str(), &output.stdout)?;
        debug!("Container {} declares {} mounts", id.short(), volumes.len());
        Ok(volumes)
    }

    async fn image_exists(&self, image: &str) -> PackrunResult<bool> {
        let args = ["inspect", "--type", "image", "--format", "{{.Id}}", image];
        let output = self.exec(&args).await?;
        if output.status.success() {
            return Ok(true);
        }

        // Anything but a plain miss (daemon down, no permission) must not
        // turn into a build attempt
        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_missing_image(&stderr) {
            Ok(false)
        } else {
            Err(PackrunError::command_exec(
                self.describe(&args),
                stderr.trim(),
            ))
        }
    }

    async fn build_image(
        &self,
        tag: &str,
        labels: &[(String, String)],
        context: Vec<u8>,
        on_output: &(dyn Fn(String) + Send + Sync),
    ) -> PackrunResult<()> {
        let mut args = vec!["build".to_string(), "-t".to_string(), tag.to_string()];
        for (key, value) in labels {
            args.push("--label".to_string());
            args.push(format!("{}={}", key, value));
        }
        args.push("-".to_string());

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let command = self.describe(&arg_refs);
        info!("Building image {}", tag);
        debug!("Executing: {}", command);

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PackrunError::command_failed(command.clone(), e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PackrunError::command_exec(command.clone(), "stdin not piped"))?;

        // The daemon may start printing before it has read the whole context,
        // so feed stdin and drain output together.
        let feed = async move {
            let result = stdin.write_all(&context).await;
            drop(stdin);
            result
        };
        let (fed, lines) = tokio::join!(feed, stream_child_output(&mut child, on_output));

        let status = child
            .wait()
            .await
            .map_err(|e| PackrunError::command_failed(command.clone(), e))?;

        if status.success() {
            fed.map_err(|e| PackrunError::io("sending build context", e))?;
            Ok(())
        } else {
            Err(PackrunError::ImageBuild {
                tag: tag.to_string(),
                output: lines.join("\n"),
            })
        }
    }

    fn daemon_name(&self) -> &str {
        self.binary
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("docker")
    }
}
