//! packrun - run commands inside a test-pack project container
//!
//! Mounts the project into an image matching its runtime version, maps
//! paths for whichever daemon does the mounting, and runs the command as
//! the invoking user.

pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod image;
pub mod orchestration;
pub mod paths;

pub use error::{PackrunError, PackrunResult};
