//! Orchestration module for the container daemon
//!
//! Provides the daemon seam and everything needed to launch one run:
//! - `ContainerDaemon`: inspect, image existence, build
//! - `RunSpec` / `RunInvocation`: the final `run` command line
//! - `ProcessExec`: process replacement or spawn-and-wait

pub mod container;
mod daemon;
mod docker;
mod exec;
mod platform;

pub use container::{layout, BindMount, RunInvocation, RunSpec};
pub use daemon::ContainerDaemon;
pub use docker::{parse_inspect_mounts, DockerCli};
pub use exec::{default_exec, ProcessExec, SpawnAndWait};
pub use platform::Platform;

#[cfg(unix)]
pub use exec::ReplaceProcess;

use tokio::io::{AsyncBufReadExt, BufReader};

/// Stream stdout+stderr from a child process, calling `on_output` for each line.
///
/// Returns all collected output lines for error reporting. Streams that were
/// not piped are treated as already closed.
pub(crate) async fn stream_child_output(
    child: &mut tokio::process::Child,
    on_output: &(dyn Fn(String) + Send + Sync),
) -> Vec<String> {
    let stderr = child.stderr.take();
    let stdout = child.stdout.take();

    let mut stderr_done = stderr.is_none();
    let mut stdout_done = stdout.is_none();

    let mut stderr_reader = stderr.map(|s| BufReader::new(s).lines());
    let mut stdout_reader = stdout.map(|s| BufReader::new(s).lines());

    let mut all_output = Vec::new();

    while !stderr_done || !stdout_done {
        tokio::select! {
            line = next_line(&mut stderr_reader), if !stderr_done => {
                match line {
                    Some(line) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    None => stderr_done = true,
                }
            }
            line = next_line(&mut stdout_reader), if !stdout_done => {
                match line {
                    Some(line) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    None => stdout_done = true,
                }
            }
        }
    }

    all_output
}

async fn next_line<R>(reader: &mut Option<tokio::io::Lines<BufReader<R>>>) -> Option<String>
where
    R: tokio::io::AsyncRead + Unpin,
{
    match reader {
        Some(lines) => lines.next_line().await.ok().flatten(),
        None => None,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Stdio;
    use std::sync::Mutex;

    #[tokio::test]
    async fn streams_both_pipes() {
        let mut child = tokio::process::Command::new("/bin/sh")
            .args(["-c", "echo out; echo err >&2"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();

        let seen = Mutex::new(Vec::new());
        let record = |line: String| seen.lock().unwrap().push(line);
        let mut lines = stream_child_output(&mut child, &record).await;
        child.wait().await.unwrap();

        lines.sort();
        assert_eq!(lines, vec!["err", "out"]);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }
}
