//! Run-Exec collaborator
//!
//! Hands the final `docker run` command line to the operating system. Unix
//! hosts replace the packrun process outright; elsewhere packrun spawns the
//! client and waits. Either way the container's exit code becomes ours.

use crate::error::{PackrunError, PackrunResult};
use crate::orchestration::container::RunInvocation;
use async_trait::async_trait;
use std::process::Stdio;
use tracing::debug;

/// Executes a run invocation and reports its exit code
#[async_trait]
pub trait ProcessExec: Send + Sync {
    /// Run to completion; returns the exit code to propagate
    async fn exec(&self, invocation: &RunInvocation) -> PackrunResult<i32>;
}

/// Spawn the daemon client as a child and wait for it
pub struct SpawnAndWait;

#[async_trait]
impl ProcessExec for SpawnAndWait {
    async fn exec(&self, invocation: &RunInvocation) -> PackrunResult<i32> {
        debug!(
            "Spawning: {} {:?}",
            invocation.program.display(),
            invocation.args
        );

        let status = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| {
                PackrunError::command_failed(invocation.program.display().to_string(), e)
            })?;

        status.code().ok_or(PackrunError::ProcessSignaled)
    }
}

/// Replace the current process image with the daemon client
#[cfg(unix)]
pub struct ReplaceProcess;

#[cfg(unix)]
#[async_trait]
impl ProcessExec for ReplaceProcess {
    async fn exec(&self, invocation: &RunInvocation) -> PackrunResult<i32> {
        use std::os::unix::process::CommandExt;

        debug!(
            "Replacing process: {} {:?}",
            invocation.program.display(),
            invocation.args
        );

        // Only returns on failure
        let err = std::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .exec();
        Err(PackrunError::command_failed(
            invocation.program.display().to_string(),
            err,
        ))
    }
}

/// Pick the exec strategy the platform supports
pub fn default_exec() -> Box<dyn ProcessExec> {
    #[cfg(unix)]
    {
        Box::new(ReplaceProcess)
    }
    #[cfg(not(unix))]
    {
        Box::new(SpawnAndWait)
    }
}
