//! Run command - execute a command inside the project container

use crate::cli::args::RunArgs;
use crate::cli::commands::image::obtain_image;
use crate::cli::commands::{current_dir, load_project};
use crate::config::project::PROJECT_FILE;
use crate::config::{Project, RunConfig};
use crate::error::PackrunResult;
use crate::identity::BootstrapScript;
use crate::orchestration::{
    default_exec, layout, BindMount, ContainerDaemon, DockerCli, ProcessExec, RunInvocation,
    RunSpec,
};
use crate::paths::{ContainmentProbe, PathResolver};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Execute the run command, returning the container's exit code
pub async fn execute(args: RunArgs, config: &RunConfig) -> PackrunResult<i32> {
    let cwd = current_dir()?;
    let daemon = DockerCli::new(&config.docker);
    let probe = config.probe();

    let invocation = plan(&args.command, config, &cwd, &daemon, probe.as_ref()).await?;

    info!("Starting container from {}", daemon.daemon_name());
    default_exec().exec(&invocation).await
}

/// Work out the full `docker run` invocation for `command`.
///
/// Project and version checks happen before the daemon is touched.
pub async fn plan(
    command: &[String],
    config: &RunConfig,
    cwd: &Path,
    daemon: &dyn ContainerDaemon,
    probe: &dyn ContainmentProbe,
) -> PackrunResult<RunInvocation> {
    let project = load_project(cwd).await?;
    daemon.ensure_installed().await?;

    let resolver = PathResolver::new(config.platform, probe.detect(), daemon);
    let project_source = resolver.resolve(project.root()).await?;
    debug!("Project volume source: {}", project_source);

    let image = obtain_image(daemon, &project).await?;
    debug!("Using {} image {}", image.source, image.image);

    let command = if command.is_empty() {
        vec![layout::DEFAULT_COMMAND.to_string()]
    } else {
        command.to_vec()
    };

    let bootstrap = BootstrapScript::new(config.identity);
    let workdir = container_workdir(&project, cwd);

    let spec = RunSpec {
        image: image.image,
        volumes: vec![format!("{}:{}", config.cache_volume(), layout::CACHE_MOUNT)],
        binds: vec![BindMount::new(
            project_source.as_str(),
            layout::PROJECT_MOUNT,
        )],
        env: BTreeMap::from([(
            layout::CONFIG_ENV.to_string(),
            format!("{}/{}", layout::PROJECT_MOUNT, PROJECT_FILE),
        )]),
        // Both follow the terminal; piped runs get neither
        interactive: config.tty,
        tty: config.tty,
        entrypoint: Some(layout::SHELL.to_string()),
        extra_opts: config.docker_opts.clone(),
        command: bootstrap.entrypoint_args(&workdir, &command),
    };

    Ok(RunInvocation::new(&config.docker, &spec))
}

/// Container-side counterpart of the caller's working directory
pub fn container_workdir(project: &Project, cwd: &Path) -> String {
    let mut workdir = layout::PROJECT_MOUNT.to_string();
    for part in project.relative_dir(cwd) {
        workdir.push('/');
        workdir.push_str(&part);
    }
    workdir
}

/// Map a child exit code onto a process exit status
pub fn exit_status(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PackrunError;
    use crate::identity::{Identity, BOOTSTRAP_ARG0};
    use crate::orchestration::Platform;
    use crate::paths::{ContainerId, FixedProbe, VolumeMap, VolumeMount};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const ID: &str = "3f4e8a0b9c1d2e3f4a5b6c7d8e9f0a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6e7f";

    /// Daemon double counting every call
    #[derive(Default)]
    struct CountingDaemon {
        calls: AtomicUsize,
        builds: AtomicUsize,
        volumes: VolumeMap,
    }

    #[async_trait]
    impl ContainerDaemon for CountingDaemon {
        async fn ensure_installed(&self) -> PackrunResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn inspect_mounts(&self, _id: &ContainerId) -> PackrunResult<VolumeMap> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.volumes.clone())
        }

        async fn image_exists(&self, _image: &str) -> PackrunResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        }

        async fn build_image(
            &self,
            _tag: &str,
            _labels: &[(String, String)],
            _context: Vec<u8>,
            _on_output: &(dyn Fn(String) + Send + Sync),
        ) -> PackrunResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.builds.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn daemon_name(&self) -> &str {
            "counting"
        }
    }

    fn config() -> RunConfig {
        RunConfig {
            docker: PathBuf::from("docker"),
            docker_opts: vec![],
            platform: Platform::Linux,
            identity: Identity::new(1001, 1001),
            user_name: "alice".to_string(),
            tty: false,
            container_override: None,
        }
    }

    fn project(version: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("testpack.toml"),
            format!("version = \"{}\"\n", version),
        )
        .unwrap();
        temp
    }

    fn echo_hi() -> Vec<String> {
        vec!["echo".to_string(), "hi".to_string()]
    }

    #[tokio::test]
    async fn plain_linux_run() {
        let temp = project("23");
        let daemon = CountingDaemon::default();

        let invocation = plan(
            &echo_hi(),
            &config(),
            temp.path(),
            &daemon,
            &FixedProbe::none(),
        )
        .await
        .unwrap();

        let args = &invocation.args;
        assert_eq!(invocation.program, PathBuf::from("docker"));
        assert_eq!(args[0], "run");

        // Base image, nothing built
        assert!(args.contains(&"ghcr.io/testpack/runtime:23".to_string()));
        assert_eq!(daemon.builds.load(Ordering::SeqCst), 0);

        // Project mount source is the root, unchanged
        let project_mount = format!(
            "type=bind,source={},target=/home/pack/project",
            temp.path().display()
        );
        assert_eq!(invocation.flag_value("--mount"), Some(project_mount.as_str()));
        assert_eq!(
            invocation.flag_value("-e"),
            Some("TESTPACK_CONFIG=/home/pack/project/testpack.toml")
        );

        // No terminal attached: neither -i nor -t
        assert!(!args.contains(&"-i".to_string()));
        assert!(!args.contains(&"-t".to_string()));
        assert!(args.contains(&"packrun-cache-alice:/home/pack/.cache".to_string()));

        // Bootstrap remaps to 1001:1001 and ends with the command
        assert_eq!(invocation.flag_value("--entrypoint"), Some("/bin/sh"));
        let script = invocation.flag_value("-c").unwrap();
        assert!(script.contains("chown -h 1001:1001"));
        assert!(script.contains(r#"exec setpriv --reuid=1001 --regid=1001 --init-groups "$@""#));

        let arg0 = args.iter().position(|a| a == BOOTSTRAP_ARG0).unwrap();
        assert_eq!(
            &args[arg0 + 1..],
            &["/home/pack/project", "echo", "hi"]
        );
    }

    #[tokio::test]
    async fn unsupported_version_never_touches_daemon() {
        let temp = project("19");
        let daemon = CountingDaemon::default();

        let err = plan(
            &echo_hi(),
            &config(),
            temp.path(),
            &daemon,
            &FixedProbe::none(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PackrunError::UnsupportedVersion { .. }));
        assert_eq!(daemon.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn outside_project_fails() {
        let temp = TempDir::new().unwrap();
        let daemon = CountingDaemon::default();

        let err = plan(&echo_hi(), &config(), temp.path(), &daemon, &FixedProbe::none())
            .await
            .unwrap_err();

        assert!(matches!(err, PackrunError::ProjectNotFound(_)));
        assert_eq!(daemon.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn containerized_run_maps_project_volume() {
        let temp = project("23");
        let root = temp.path().to_string_lossy().into_owned();
        let daemon = CountingDaemon {
            volumes: VolumeMap::new(vec![VolumeMount::new(root, "/srv/ci/checkout")]),
            ..Default::default()
        };
        let probe = FixedProbe::new(ContainerId::parse(ID));

        let nested = temp.path().join("pkg");
        std::fs::create_dir(&nested).unwrap();
        let invocation = plan(&echo_hi(), &config(), &nested, &daemon, &probe)
            .await
            .unwrap();

        assert_eq!(
            invocation.flag_value("--mount"),
            Some("type=bind,source=/srv/ci/checkout,target=/home/pack/project")
        );
        let arg0 = invocation
            .args
            .iter()
            .position(|a| a == BOOTSTRAP_ARG0)
            .unwrap();
        assert_eq!(invocation.args[arg0 + 1], "/home/pack/project/pkg");
    }

    #[tokio::test]
    async fn setup_script_builds_custom_image() {
        let temp = project("23");
        std::fs::create_dir(temp.path().join(".testpack")).unwrap();
        std::fs::write(temp.path().join(".testpack/setup.sh"), "#!/bin/sh\n").unwrap();
        let daemon = CountingDaemon::default();

        let invocation = plan(&echo_hi(), &config(), temp.path(), &daemon, &FixedProbe::none())
            .await
            .unwrap();

        assert_eq!(daemon.builds.load(Ordering::SeqCst), 1);
        assert!(invocation
            .args
            .iter()
            .any(|a| a.starts_with("packrun-setup:")));
    }

    #[tokio::test]
    async fn extra_opts_and_default_shell() {
        let temp = project("24");
        let daemon = CountingDaemon::default();
        let config = RunConfig {
            docker_opts: vec!["--network".to_string(), "none".to_string()],
            tty: true,
            ..config()
        };

        let invocation = plan(&[], &config, temp.path(), &daemon, &FixedProbe::none())
            .await
            .unwrap();

        let args = &invocation.args;
        assert_eq!(&args[..4], &["run", "--rm", "-i", "-t"]);
        let opt = args.iter().position(|a| a == "--network").unwrap();
        let image = args
            .iter()
            .position(|a| a == "ghcr.io/testpack/runtime:24")
            .unwrap();
        assert_eq!(opt + 2, image);
        assert_eq!(args.last().unwrap(), "/bin/bash");
    }

    #[tokio::test]
    async fn colon_in_project_path_survives() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("build:2");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("testpack.toml"), "version = \"23\"\n").unwrap();
        let daemon = CountingDaemon::default();

        let invocation = plan(&echo_hi(), &config(), &root, &daemon, &FixedProbe::none())
            .await
            .unwrap();

        let expected = format!(
            "type=bind,source={},target=/home/pack/project",
            root.display()
        );
        assert_eq!(invocation.flag_value("--mount"), Some(expected.as_str()));
    }

    #[test]
    fn exit_status_mapping() {
        assert_eq!(exit_status(0), 0);
        assert_eq!(exit_status(42), 42);
        assert_eq!(exit_status(255), 255);
        assert_eq!(exit_status(-1), 1);
        assert_eq!(exit_status(300), 1);
    }
}
