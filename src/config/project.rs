//! Project discovery
//!
//! A project is the nearest ancestor of the working directory holding
//! `testpack.toml`. Its optional setup script customises the image.

use crate::config::schema::ProjectConfig;
use crate::error::{PackrunError, PackrunResult};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Marker file at the project root
pub const PROJECT_FILE: &str = "testpack.toml";

/// Setup script location, relative to the project root
pub const SETUP_SCRIPT: &str = ".testpack/setup.sh";

/// A discovered test-pack project
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config: ProjectConfig,
}

impl Project {
    /// Walk up from `start` to the nearest directory with a marker file
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join(PROJECT_FILE).is_file())
            .map(Path::to_path_buf)
    }

    /// Discover and load the project containing `cwd`
    pub async fn discover(cwd: &Path) -> PackrunResult<Self> {
        let root =
            Self::find_root(cwd).ok_or_else(|| PackrunError::ProjectNotFound(cwd.to_path_buf()))?;
        debug!("Project root: {}", root.display());
        Self::load(root).await
    }

    /// Load the project rooted at `root`
    pub async fn load(root: PathBuf) -> PackrunResult<Self> {
        let path = root.join(PROJECT_FILE);
        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| PackrunError::io(format!("reading {}", path.display()), e))?;

        let config = ProjectConfig::parse(&content).map_err(|e| PackrunError::ConfigInvalid {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self { root, config })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Contents of the setup script, or `None` when the project has none
    pub async fn setup_script(&self) -> PackrunResult<Option<Vec<u8>>> {
        let path = self.root.join(SETUP_SCRIPT);
        match fs::read(&path).await {
            Ok(content) => {
                debug!("Setup script: {} ({} bytes)", path.display(), content.len());
                Ok(Some(content))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PackrunError::io(format!("reading {}", path.display()), e)),
        }
    }

    /// Position of `cwd` inside the project as POSIX components.
    ///
    /// Empty when `cwd` is the root or lies outside it.
    pub fn relative_dir(&self, cwd: &Path) -> Vec<String> {
        cwd.strip_prefix(&self.root)
            .map(|rel| {
                rel.components()
                    .filter_map(|c| match c {
                        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
