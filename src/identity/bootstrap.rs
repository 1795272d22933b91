//! In-container bootstrap script
//!
//! Runs as root under `/bin/sh -c` as the container entrypoint, remaps the
//! `pack` account to the host identity, then drops privileges and execs the
//! user's command. Positional parameters carry the working directory and
//! the command so they never pass through shell parsing.

use crate::identity::Identity;
use crate::orchestration::layout;

/// `$0` of the bootstrap shell, shown in `ps` inside the container
pub const BOOTSTRAP_ARG0: &str = "packrun-bootstrap";

/// Bootstrap sequence for one identity
#[derive(Debug, Clone)]
pub struct BootstrapScript {
    identity: Identity,
}

impl BootstrapScript {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    /// Recursive ownership rewrite of the state directory.
    ///
    /// The project mount is pruned so host files keep their real owners.
    pub fn ownership_command(&self) -> String {
        format!(
            "find {state} -path {project} -prune -o -exec chown -h {id} {{}} +",
            state = layout::STATE_DIR,
            project = layout::PROJECT_MOUNT,
            id = self.identity,
        )
    }

    /// Account database rewrites; the account name is preserved
    pub fn account_commands(&self) -> [String; 2] {
        let Identity { uid, gid } = self.identity;
        let account = layout::ACCOUNT;
        [
            format!(
                r"sed -i -e 's/^{account}:\([^:]*\):[0-9]*:[0-9]*:/{account}:\1:{uid}:{gid}:/' /etc/passwd"
            ),
            format!(r"sed -i -e 's/^{account}:\([^:]*\):[0-9]*:/{account}:\1:{gid}:/' /etc/group"),
        ]
    }

    /// Full script text
    pub fn render(&self) -> String {
        let Identity { uid, gid } = self.identity;
        let mut lines = vec!["set -e".to_string()];

        if !self.identity.is_root() {
            lines.push(self.ownership_command());
            lines.extend(self.account_commands());
        }

        lines.push(r#"cd "$1""#.to_string());
        lines.push("shift".to_string());
        lines.push(format!(
            "export {}={}/testpack.toml",
            layout::CONFIG_ENV,
            layout::PROJECT_MOUNT
        ));
        lines.push(format!("export HOME={}", layout::STATE_DIR));

        if self.identity.is_root() {
            lines.push(r#"exec "$@""#.to_string());
        } else {
            lines.push(format!(
                r#"exec setpriv --reuid={uid} --regid={gid} --init-groups "$@""#
            ));
        }

        let mut script = lines.join("\n");
        script.push('\n');
        script
    }

    /// Arguments following the image for `--entrypoint /bin/sh`
    pub fn entrypoint_args(&self, workdir: &str, command: &[String]) -> Vec<String> {
        let mut args = vec![
            "-c".to_string(),
            self.render(),
            BOOTSTRAP_ARG0.to_string(),
            workdir.to_string(),
        ];
        args.extend(command.iter().cloned());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script() -> BootstrapScript {
        BootstrapScript::new(Identity::new(1001, 1001))
    }

    #[test]
    fn ownership_excludes_only_project_mount() {
        let rendered = script().render();
        let chown_line = rendered
            .lines()
            .find(|l| l.contains("chown"))
            .expect("ownership rewrite present");

        assert!(chown_line.starts_with("find /home/pack "));
        assert_eq!(chown_line.matches("-prune").count(), 1);
        assert_eq!(chown_line.matches("-path").count(), 1);
        assert!(chown_line.contains("-path /home/pack/project -prune -o"));
        assert!(chown_line.contains("chown -h 1001:1001"));
    }

    #[test]
    fn account_rewrite_keeps_name() {
        let [passwd, group] = script().account_commands();
        assert!(passwd.contains(r"s/^pack:\([^:]*\):[0-9]*:[0-9]*:/pack:\1:1001:1001:/"));
        assert!(passwd.ends_with("/etc/passwd"));
        assert!(group.contains(r"s/^pack:\([^:]*\):[0-9]*:/pack:\1:1001:/"));
        assert!(group.ends_with("/etc/group"));
    }

    #[test]
    fn steps_in_order() {
        let rendered = script().render();
        let pos = |needle: &str| rendered.find(needle).unwrap();

        assert!(rendered.starts_with("set -e\n"));
        assert!(pos("find ") < pos("/etc/passwd"));
        assert!(pos("/etc/passwd") < pos("/etc/group"));
        assert!(pos("/etc/group") < pos(r#"cd "$1""#));
        assert!(pos(r#"cd "$1""#) < pos("export TESTPACK_CONFIG"));
        assert!(rendered
            .trim_end()
            .ends_with(r#"exec setpriv --reuid=1001 --regid=1001 --init-groups "$@""#));
    }

    #[test]
    fn marker_variable_points_at_mounted_config() {
        let rendered = script().render();
        assert!(rendered.contains("export TESTPACK_CONFIG=/home/pack/project/testpack.toml\n"));
    }

    #[test]
    fn root_identity_skips_remap() {
        let rendered = BootstrapScript::new(Identity::new(0, 0)).render();
        assert!(!rendered.contains("chown"));
        assert!(!rendered.contains("/etc/passwd"));
        assert!(!rendered.contains("setpriv"));
        assert!(rendered.contains(r#"exec "$@""#));
    }

    #[test]
    fn entrypoint_args_pass_command_positionally() {
        let command = vec!["echo".to_string(), "hi there".to_string()];
        let args = script().entrypoint_args("/home/pack/project/sub", &command);

        assert_eq!(args[0], "-c");
        assert_eq!(args[2], BOOTSTRAP_ARG0);
        assert_eq!(args[3], "/home/pack/project/sub");
        assert_eq!(&args[4..], &["echo", "hi there"]);
    }
}
