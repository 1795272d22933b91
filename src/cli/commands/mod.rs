//! CLI command implementations

pub mod image;
pub mod resolve;
pub mod run;

pub use image::execute as image;
pub use resolve::execute as resolve;
pub use run::execute as run;

use crate::config::Project;
use crate::error::{PackrunError, PackrunResult};
use std::path::PathBuf;

/// Current working directory of the invoking process
pub(crate) fn current_dir() -> PackrunResult<PathBuf> {
    std::env::current_dir().map_err(|e| PackrunError::io("getting current directory", e))
}

/// Discover the project around `cwd` and check its runtime version.
///
/// Runs before anything talks to the daemon.
pub(crate) async fn load_project(cwd: &std::path::Path) -> PackrunResult<Project> {
    let project = Project::discover(cwd).await?;
    project.config().validate()?;
    Ok(project)
}
