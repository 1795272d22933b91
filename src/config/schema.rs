//! Project configuration schema
//!
//! Stored at `<project root>/testpack.toml`:
//!
//! ```toml
//! version = "23"
//! ```

use crate::error::{PackrunError, PackrunResult};
use serde::Deserialize;

/// Runtime versions whose images follow the packrun container protocol
pub const SUPPORTED_VERSIONS: &[&str] = &["21", "22", "23", "24"];

/// Registry repository holding the base images, tagged by version
pub const BASE_IMAGE_REPOSITORY: &str = "ghcr.io/testpack/runtime";

/// Root of `testpack.toml`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectConfig {
    /// Target runtime version
    pub version: String,
}

impl ProjectConfig {
    /// Parse from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Fail unless packrun knows how to run this version
    pub fn validate(&self) -> PackrunResult<()> {
        if SUPPORTED_VERSIONS.contains(&self.version.trim()) {
            Ok(())
        } else {
            Err(PackrunError::UnsupportedVersion {
                version: self.version.clone(),
                current: env!("CARGO_PKG_VERSION"),
                supported: SUPPORTED_VERSIONS.join(", "),
            })
        }
    }

    /// Canonical base image for the declared version
    pub fn base_image(&self) -> String {
        base_image(self.version.trim())
    }
}

/// Canonical base image for a runtime version
pub fn base_image(version: &str) -> String {
    format!("{}:{}", BASE_IMAGE_REPOSITORY, version)
}
