mod app;

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::Mutex,
};

use rmmvz_core::{
    config::{self, AppConfig},
    ChannelPrompter, Launcher, SystemToolchain,
};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

const EVENT_CAPACITY: usize = 256;
const DIALOG_CAPACITY: usize = 8;

#[tokio::main]
async fn main() -> Result<()> {
    let log_path = init_logging()?;

    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load()?;
    info!(
        config = %config_path.display(),
        log = %log_path.display(),
        "launcher starting"
    );

    let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
    let (prompter, dialogs_rx) = ChannelPrompter::channel(DIALOG_CAPACITY);
    let tools = SystemToolchain::new(&config);
    let launcher = Launcher::new(config, tools, prompter, events_tx);

    let mut app = app::LauncherApp::new(launcher, events_rx, dialogs_rx);
    app.run().await
}

// The terminal owns stdout, so logs only go to a file.
fn init_logging() -> Result<PathBuf> {
    let log_dir = log_root(dirs::data_local_dir(), std::env::current_dir)?.join("logs");
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("rmmvz-launcher.log");

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(log_path)
}

// The working directory is only consulted when there is no platform data dir.
fn log_root(
    data_dir: Option<PathBuf>,
    fallback: impl FnOnce() -> std::io::Result<PathBuf>,
) -> Result<PathBuf> {
    match data_dir {
        Some(dir) => Ok(dir.join("rmmvz-launcher")),
        None => fallback().context("no data directory and no working directory for logs"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn data_dir_wins_without_touching_working_dir() -> Result<()> {
        let root = log_root(Some(PathBuf::from("/data")), || {
            Err(io::Error::new(io::ErrorKind::NotFound, "cwd removed"))
        })?;
        assert_eq!(root, PathBuf::from("/data").join("rmmvz-launcher"));
        Ok(())
    }

    #[test]
    fn working_dir_is_the_fallback() -> Result<()> {
        let root = log_root(None, || Ok(PathBuf::from("/work")))?;
        assert_eq!(root, PathBuf::from("/work"));
        assert!(log_root(None, || Err(io::Error::new(io::ErrorKind::NotFound, "gone"))).is_err());
        Ok(())
    }
}
