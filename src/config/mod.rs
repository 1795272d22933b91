//! Configuration management for packrun
//!
//! Environment overrides are read once, by clap, into a `RunConfig` that is
//! passed down explicitly. Project settings live in `testpack.toml`.

pub mod project;
pub mod schema;

pub use project::Project;
pub use schema::ProjectConfig;

use crate::error::{PackrunError, PackrunResult};
use crate::identity::{invoking_user_name, Identity};
use crate::orchestration::Platform;
use crate::paths::{CgroupProbe, ContainerId, ContainmentProbe, FixedProbe};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Default daemon client binary
pub const DEFAULT_DOCKER: &str = "docker";

/// Invocation-wide settings
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Daemon client binary (`PACKRUN_DOCKER`)
    pub docker: PathBuf,
    /// Extra `run` flags (`PACKRUN_DOCKER_OPTS`), already split
    pub docker_opts: Vec<String>,
    /// Host platform
    pub platform: Platform,
    /// Owner for files created in the container
    pub identity: Identity,
    /// Invoking user name, used to scope the cache volume
    pub user_name: String,
    /// Whether stdin and stdout are attached to a terminal
    pub tty: bool,
    /// Skip cgroup detection and assume this container id
    pub container_override: Option<ContainerId>,
}

impl RunConfig {
    /// Build the configuration for this process
    pub fn detect(
        docker: Option<PathBuf>,
        docker_opts: Option<&str>,
        container_override: Option<ContainerId>,
    ) -> PackrunResult<Self> {
        let platform = Platform::detect();
        let identity = Identity::detect(platform);

        Ok(Self {
            docker: docker.unwrap_or_else(|| PathBuf::from(DEFAULT_DOCKER)),
            docker_opts: split_docker_opts(docker_opts.unwrap_or_default())?,
            platform,
            identity,
            user_name: invoking_user_name(identity),
            tty: std::io::stdin().is_terminal() && std::io::stdout().is_terminal(),
            container_override,
        })
    }

    /// Containment probe for this configuration
    pub fn probe(&self) -> Box<dyn ContainmentProbe> {
        match self.container_override {
            Some(ref id) => Box::new(FixedProbe::new(Some(id.clone()))),
            None if self.platform.is_linux() => Box::new(CgroupProbe::new()),
            None => Box::new(FixedProbe::none()),
        }
    }

    /// Name of the per-user cache volume
    pub fn cache_volume(&self) -> String {
        format!("packrun-cache-{}", self.user_name)
    }
}

/// Split extra daemon flags on unescaped whitespace.
///
/// One level of shell-style unescaping: `\x` outside quotes is a literal
/// `x`, single quotes are literal, double quotes allow `\"` and `\\`.
pub fn split_docker_opts(raw: &str) -> PackrunResult<Vec<String>> {
    #[derive(PartialEq)]
    enum Quote {
        None,
        Single,
        Double,
    }

    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote = Quote::None;
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        match quote {
            Quote::Single => {
                if c == '\'' {
                    quote = Quote::None;
                } else {
                    current.push(c);
                }
            }
            Quote::Double => match c {
                '"' => quote = Quote::None,
                '\\' => match chars.next() {
                    Some(next @ ('"' | '\\')) => current.push(next),
                    Some(next) => {
                        current.push('\\');
                        current.push(next);
                    }
                    None => {
                        return Err(PackrunError::DockerOpts(
                            "trailing backslash".to_string(),
                        ))
                    }
                },
                _ => current.push(c),
            },
            Quote::None => match c {
                '\\' => {
                    let next = chars.next().ok_or_else(|| {
                        PackrunError::DockerOpts("trailing backslash".to_string())
                    })?;
                    current.push(next);
                    in_word = true;
                }
                '\'' => {
                    quote = Quote::Single;
                    in_word = true;
                }
                '"' => {
                    quote = Quote::Double;
                    in_word = true;
                }
                c if c.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                c => {
                    current.push(c);
                    in_word = true;
                }
            },
        }
    }

    if quote != Quote::None {
        return Err(PackrunError::DockerOpts(format!(
            "unterminated quote in: {}",
            raw
        )));
    }
    if in_word {
        words.push(current);
    }

    Ok(words)
}
