//! Customised image management
//!
//! A project's `.testpack/setup.sh` is baked into an image derived from the
//! base image for its runtime version. Images are content-addressed by
//! `ImageKey`, so a given (version, script) pair is built at most once.

mod cache;
mod context;
mod key;

pub use cache::ImageCache;
pub use context::{build_context, generate_dockerfile};
pub use key::{ImageKey, SETUP_IMAGE_REPOSITORY};

use std::fmt;

/// Image label keys recorded on built images
pub mod labels {
    /// Full setup image key
    pub const SETUP_HASH: &str = "io.packrun.setup.hash";
    /// Runtime version the image was built for
    pub const VERSION: &str = "io.packrun.setup.version";
    /// Base image the setup script was applied to
    pub const BASE_IMAGE: &str = "io.packrun.setup.base";
    /// Creation timestamp (RFC3339)
    pub const CREATED_AT: &str = "io.packrun.setup.created_at";
}

/// Where an image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Published base image, no customisation
    Base,
    /// Customised image already present on the daemon
    Cached,
    /// Customised image built by this invocation
    Built,
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => write!(f, "base"),
            Self::Cached => write!(f, "cached"),
            Self::Built => write!(f, "built"),
        }
    }
}

/// Image chosen for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Reference passed to `docker run`
    pub image: String,
    pub source: ImageSource,
}
