//! Image command - print (and build if needed) the project image

use crate::cli::commands::{current_dir, load_project};
use crate::config::{Project, RunConfig};
use crate::error::PackrunResult;
use crate::image::{ImageCache, ImageRef};
use crate::orchestration::{ContainerDaemon, DockerCli};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Execute the image command
pub async fn execute(config: &RunConfig) -> PackrunResult<()> {
    let cwd = current_dir()?;
    let project = load_project(&cwd).await?;

    let daemon = DockerCli::new(&config.docker);
    daemon.ensure_installed().await?;

    let image = obtain_image(&daemon, &project).await?;

    eprintln!("{} {} image", style("✓").green(), image.source);
    println!("{}", image.image);
    Ok(())
}

/// Get the project's image, with a spinner while a build runs
pub(crate) async fn obtain_image(
    daemon: &dyn ContainerDaemon,
    project: &Project,
) -> PackrunResult<ImageRef> {
    let setup = project.setup_script().await?;
    let cache = ImageCache::new(daemon);

    let pb = match setup {
        Some(_) => create_progress_bar("Preparing project image..."),
        None => ProgressBar::hidden(),
    };
    let progress = pb.clone();
    let on_output = move |line: String| progress.set_message(line);

    let result = cache
        .get_image(project.config().version.trim(), setup.as_deref(), &on_output)
        .await;

    pb.finish_and_clear();
    result
}

fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
