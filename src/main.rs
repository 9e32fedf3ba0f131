//! `LyricPad` command-line entry point.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lyricpad::cli::{self, Cli};
use lyricpad::config::Config;

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "lyricpad=info",
        _ => "lyricpad=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load()
        .context("Failed to load config")?
        .with_data_dir(cli.data_dir.clone());
    tracing::info!(
        "{} {} using {}",
        config.app_name(),
        config.app_version(),
        config.data_dir.display()
    );

    let mut stdout = std::io::stdout().lock();
    cli::run(cli, &config, &mut stdout)?;
    Ok(())
}
