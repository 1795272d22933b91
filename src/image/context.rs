//! In-memory build context
//!
//! A tar archive holding a generated Dockerfile plus the setup script,
//! streamed to `docker build -` on stdin.

use crate::config::project::SETUP_SCRIPT;
use crate::error::{PackrunError, PackrunResult};
use crate::orchestration::layout;

/// Name of the setup script inside the build context
const CONTEXT_SCRIPT: &str = "setup.sh";

/// Generate the Dockerfile that applies the setup script to `base_image`.
///
/// The script lands where the project keeps it, relative to the project
/// mount, and runs from the project directory.
pub fn generate_dockerfile(base_image: &str) -> String {
    let target = format!("{}/{}", layout::PROJECT_MOUNT, SETUP_SCRIPT);
    let lines = [
        format!("FROM {}", base_image),
        "USER root".to_string(),
        format!("WORKDIR {}", layout::PROJECT_MOUNT),
        format!("COPY {} {}", CONTEXT_SCRIPT, target),
        format!("RUN chmod +x {target} && {target}"),
    ];

    let mut dockerfile = lines.join("\n");
    dockerfile.push('\n');
    dockerfile
}

/// Pack the Dockerfile and setup script into a tar archive
pub fn build_context(base_image: &str, setup_script: &[u8]) -> PackrunResult<Vec<u8>> {
    let dockerfile = generate_dockerfile(base_image);
    let mut builder = tar::Builder::new(Vec::new());

    append_file(&mut builder, "Dockerfile", dockerfile.as_bytes(), 0o644)?;
    append_file(&mut builder, CONTEXT_SCRIPT, setup_script, 0o755)?;

    builder
        .into_inner()
        .map_err(|e| PackrunError::io("finishing build context", e))
}

fn append_file(
    builder: &mut tar::Builder<Vec<u8>>,
    name: &str,
    content: &[u8],
    mode: u32,
) -> PackrunResult<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(mode);
    header.set_mtime(0);
    header.set_cksum();

    builder
        .append_data(&mut header, name, content)
        .map_err(|e| PackrunError::io(format!("adding {} to build context", name), e))
}
