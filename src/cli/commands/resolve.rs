//! Resolve command - show the daemon-side path for host paths

use crate::cli::args::ResolveArgs;
use crate::cli::commands::current_dir;
use crate::config::RunConfig;
use crate::error::PackrunResult;
use crate::orchestration::{ContainerDaemon, DockerCli};
use crate::paths::PathResolver;
use console::{style, Emoji};

static ARROW: Emoji<'_, '_> = Emoji("→ ", "-> ");

/// Execute the resolve command
pub async fn execute(args: ResolveArgs, config: &RunConfig) -> PackrunResult<()> {
    let cwd = current_dir()?;
    let paths = if args.paths.is_empty() {
        vec![cwd.clone()]
    } else {
        args.paths.iter().map(|p| cwd.join(p)).collect()
    };

    let daemon = DockerCli::new(&config.docker);
    let probe = config.probe();
    let resolver = PathResolver::new(config.platform, probe.detect(), &daemon);

    match resolver.container() {
        Some(id) => {
            daemon.ensure_installed().await?;
            eprintln!(
                "{} {} ({})",
                style("Container:").bold(),
                id.short(),
                config.platform
            );
        }
        None => eprintln!(
            "{} none ({})",
            style("Container:").bold(),
            config.platform
        ),
    }

    for path in paths {
        let resolved = resolver.resolve(&path).await?;
        println!("{} {}{}", path.display(), ARROW, style(resolved).cyan());
    }

    Ok(())
}
