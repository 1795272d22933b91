//! Error types for packrun
//!
//! All modules use `PackrunResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for packrun operations
pub type PackrunResult<T> = Result<T, PackrunError>;

/// All errors that can occur in packrun
#[derive(Error, Debug)]
pub enum PackrunError {
    // Environment errors
    #[error("Container daemon not installed: {0}")]
    DaemonNotInstalled(String),

    #[error("Not inside a test-pack project: no testpack.toml found above {0}")]
    ProjectNotFound(PathBuf),

    #[error("testpack version {version} is not supported by packrun {current} (supported: {supported})")]
    UnsupportedVersion {
        version: String,
        current: &'static str,
        supported: String,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Invalid PACKRUN_DOCKER_OPTS: {0}")]
    DockerOpts(String),

    // Resolution errors
    #[error("Path not in any accessible volume: {path}")]
    PathNotInVolume { path: PathBuf },

    #[error("Ambiguous mount for {path}: {destination} is mounted from both {first} and {second}")]
    AmbiguousMount {
        path: PathBuf,
        destination: String,
        first: String,
        second: String,
    },

    #[error("Malformed daemon metadata for {id}: {reason}")]
    DaemonMetadata { id: String, reason: String },

    // Image errors
    #[error("Image build failed for {tag}:\n{output}")]
    ImageBuild { tag: String, output: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    #[error("Process terminated by signal")]
    ProcessSignaled,
}

impl PackrunError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    ///
    /// A spawn that fails with `NotFound` means the daemon binary itself is
    /// missing, which is reported as an environment error instead.
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        let command = command.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::DaemonNotInstalled(command);
        }
        Self::CommandFailed { command, source }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::DaemonNotInstalled(_) => {
                Some("Install Docker, or point PACKRUN_DOCKER at a compatible binary")
            }
            Self::ProjectNotFound(_) => {
                Some("Run packrun from inside a project containing testpack.toml")
            }
            Self::UnsupportedVersion { .. } => Some(
                "Update packrun to the latest release, or set `version` in testpack.toml to a supported value",
            ),
            Self::PathNotInVolume { .. } => {
                Some("Run packrun from a directory that is bind-mounted into this container")
            }
            Self::DockerOpts(_) => Some("Escape spaces inside a flag value with a backslash"),
            _ => None,
        }
    }
}
