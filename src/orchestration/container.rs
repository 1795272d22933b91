//! Container run specification
//!
//! Describes one `docker run` and lowers it to the argument vector handed to
//! the Run-Exec collaborator.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Fixed paths inside the test-pack runtime images
pub mod layout {
    /// Built-in unprivileged account shipped in every base image
    pub const ACCOUNT: &str = "pack";
    /// Runtime state directory (the account's home)
    pub const STATE_DIR: &str = "/home/pack";
    /// Where the project directory is mounted
    pub const PROJECT_MOUNT: &str = "/home/pack/project";
    /// Where the per-user cache volume is mounted
    pub const CACHE_MOUNT: &str = "/home/pack/.cache";
    /// Marker variable naming the project config inside the container
    pub const CONFIG_ENV: &str = "TESTPACK_CONFIG";
    /// Shell used as the container entrypoint
    pub const SHELL: &str = "/bin/sh";
    /// Command run when none is given
    pub const DEFAULT_COMMAND: &str = "/bin/bash";
}

/// Bind mount passed as `--mount`.
///
/// Unlike `-v source:target`, the field syntax tolerates `:` in host paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    /// Daemon-side source path
    pub source: String,
    /// Mount point inside the container
    pub target: String,
}

impl BindMount {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Value for `--mount`; fields holding `,` or `"` are CSV-quoted
    pub fn to_arg(&self) -> String {
        [
            "type=bind".to_string(),
            csv_field(&format!("source={}", self.source)),
            csv_field(&format!("target={}", self.target)),
        ]
        .join(",")
    }
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Configuration for one container run
#[derive(Debug, Clone)]
pub struct RunSpec {
    /// Container image to use
    pub image: String,
    /// Volume mounts (source:destination format)
    pub volumes: Vec<String>,
    /// Bind mounts of host paths
    pub binds: Vec<BindMount>,
    /// Environment variables
    pub env: BTreeMap<String, String>,
    /// Keep stdin open
    pub interactive: bool,
    /// Allocate a TTY
    pub tty: bool,
    /// Entrypoint override
    pub entrypoint: Option<String>,
    /// User-supplied daemon options, placed after all defaults
    pub extra_opts: Vec<String>,
    /// Arguments passed after the image
    pub command: Vec<String>,
}

impl RunSpec {
    /// Lower into `run` arguments for the daemon client
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["run".to_string(), "--rm".to_string()];

        if self.interactive {
            args.push("-i".to_string());
        }
        if self.tty {
            args.push("-t".to_string());
        }

        for v in &self.volumes {
            args.push("-v".to_string());
            args.push(v.clone());
        }

        for bind in &self.binds {
            args.push("--mount".to_string());
            args.push(bind.to_arg());
        }

        for (k, v) in &self.env {
            args.push("-e".to_string());
            args.push(format!("{}={}", k, v));
        }

        if let Some(ref entrypoint) = self.entrypoint {
            args.push("--entrypoint".to_string());
            args.push(entrypoint.clone());
        }

        // Later flags win in docker, so user options override the defaults above
        args.extend(self.extra_opts.iter().cloned());

        args.push(self.image.clone());
        args.extend(self.command.iter().cloned());
        args
    }
}

/// A fully-formed command line ready for exec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInvocation {
    /// Daemon client binary
    pub program: PathBuf,
    /// Arguments, starting with `run`
    pub args: Vec<String>,
}

impl RunInvocation {
    /// Build the invocation for a run spec
    pub fn new(program: impl Into<PathBuf>, spec: &RunSpec) -> Self {
        Self {
            program: program.into(),
            args: spec.to_args(),
        }
    }

    /// Value following the first occurrence of `flag`
    #[cfg(test)]
    pub(crate) fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}
