//! folderpush entry point.

mod app;
mod config;
mod terminal;

use indicatif::MultiProgress;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Logs and progress bars share stderr; lines are written with the bars cleared.
    let multi = MultiProgress::new();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(terminal::LogWriter::new(multi.clone()))
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting folderpush");

    let config = config::RunConfig::from_env()?;
    tracing::info!(
        root = %config.source_dir.display(),
        mode = %config.mode,
        concurrency = config.concurrency,
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()?;
    let summary = rt.block_on(app::run(&config, multi))?;

    println!("{summary}");
    Ok(())
}
