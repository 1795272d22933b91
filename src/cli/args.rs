//! CLI argument definitions using clap derive

use crate::paths::ContainerId;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// packrun - run commands inside a test-pack container
///
/// Mounts the current test-pack project into a container built for its
/// runtime version and runs the command there as the invoking user.
#[derive(Parser, Debug)]
#[command(name = "packrun")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Container daemon client binary
    #[arg(long, global = true, env = "PACKRUN_DOCKER", value_name = "PATH")]
    pub docker: Option<PathBuf>,

    /// Extra flags appended to `docker run` (backslash escapes spaces)
    #[arg(
        long,
        global = true,
        env = "PACKRUN_DOCKER_OPTS",
        value_name = "FLAGS",
        allow_hyphen_values = true
    )]
    pub docker_opts: Option<String>,

    /// Assume packrun runs inside this container instead of detecting it
    #[arg(
        long,
        global = true,
        env = "PACKRUN_CONTAINER_ID",
        value_name = "ID",
        value_parser = parse_container_id
    )]
    pub container_id: Option<ContainerId>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a command in the project container
    Run(RunArgs),

    /// Print the image the project runs in, building it if needed
    Image,

    /// Show how host paths map to daemon mount paths
    Resolve(ResolveArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Command to run (defaults to an interactive shell)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Host paths to resolve (defaults to the current directory)
    pub paths: Vec<PathBuf>,
}

fn parse_container_id(s: &str) -> Result<ContainerId, String> {
    ContainerId::parse(s.trim())
        .ok_or_else(|| format!("expected 64 lowercase hex digits, got '{}'", s))
}
