//! packrun - run commands inside a test-pack project container
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use packrun::cli::commands::run::exit_status;
use packrun::cli::{Cli, Commands};
use packrun::config::RunConfig;
use packrun::error::PackrunResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(exit_status(code)),
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> PackrunResult<i32> {
    let cli = Cli::parse();

    // PACKRUN_LOG wins; otherwise 0 = warn, 1 = info, 2+ = debug
    let filter = EnvFilter::try_from_env("PACKRUN_LOG").unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("packrun=warn"),
        1 => EnvFilter::new("packrun=info"),
        _ => EnvFilter::new("packrun=debug"),
    });

    // stdout belongs to the container
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let config = RunConfig::detect(
        cli.docker,
        cli.docker_opts.as_deref(),
        cli.container_id,
    )?;
    debug!(
        "Platform {}, identity {}, daemon {}",
        config.platform,
        config.identity,
        config.docker.display()
    );

    match cli.command {
        Commands::Run(args) => packrun::cli::commands::run(args, &config).await,
        Commands::Image => packrun::cli::commands::image(&config).await.map(|()| 0),
        Commands::Resolve(args) => packrun::cli::commands::resolve(args, &config)
            .await
            .map(|()| 0),
    }
}
