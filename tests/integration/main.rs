//! Integration tests for packrun

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn packrun() -> Command {
        let mut cmd = cargo_bin_cmd!("packrun");
        cmd.env_remove("PACKRUN_DOCKER")
            .env_remove("PACKRUN_DOCKER_OPTS")
            .env_remove("PACKRUN_CONTAINER_ID")
            .env_remove("PACKRUN_LOG");
        cmd
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

    fn missing_docker(dir: &Path) -> std::path::PathBuf {
        dir.join("no-such-docker")
    }

    #[test]
    fn help_displays() {
        packrun()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("test-pack project"));
    }

    #[test]
    fn version_displays() {
        packrun()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("packrun"));
    }

    #[test]
    fn run_help_mentions_default_shell() {
        packrun()
            .args(["run", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("interactive shell"));
    }

    #[test]
    fn outside_project_fails() {
        let temp = TempDir::new().unwrap();
        packrun()
            .current_dir(temp.path())
            .args(["run", "true"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("testpack.toml"));
    }

    #[test]
    fn unsupported_version_fails_before_daemon() {
        let temp = project("19");
        // A missing daemon would be reported if it were ever consulted
        packrun()
            .current_dir(temp.path())
            .env("PACKRUN_DOCKER", missing_docker(temp.path()))
            .args(["run", "true"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("version 19 is not supported"))
            .stderr(predicate::str::contains("daemon not installed").not());
    }

    #[test]
    fn missing_daemon_reported() {
        let temp = project("23");
        packrun()
            .current_dir(temp.path())
            .env("PACKRUN_DOCKER", missing_docker(temp.path()))
            .args(["run", "true"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Container daemon not installed"))
            .stderr(predicate::str::contains("PACKRUN_DOCKER"));
    }

    #[test]
    fn image_with_missing_daemon_fails() {
        let temp = project("22");
        packrun()
            .current_dir(temp.path())
            .env("PACKRUN_DOCKER", missing_docker(temp.path()))
            .arg("image")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Container daemon not installed"));
    }

    #[test]
    fn malformed_docker_opts_rejected() {
        let temp = project("23");
        packrun()
            .current_dir(temp.path())
            .env("PACKRUN_DOCKER_OPTS", "-e 'unterminated")
            .args(["run", "true"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Invalid PACKRUN_DOCKER_OPTS"));
    }

    #[test]
    fn invalid_container_id_rejected() {
        packrun()
            .args(["--container-id", "not-hex", "resolve"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("64 lowercase hex"));
    }

    #[test]
    fn resolve_in_container_needs_daemon() {
        let temp = TempDir::new().unwrap();
        packrun()
            .current_dir(temp.path())
            .env("PACKRUN_DOCKER", missing_docker(temp.path()))
            .env("PACKRUN_CONTAINER_ID", "a".repeat(64))
            .arg("resolve")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Container daemon not installed"));
    }
}
