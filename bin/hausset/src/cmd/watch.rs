//! Watch command - report content changes as they happen

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use hausset_server::{ContentChange, ContentWatcher};
use tokio::sync::broadcast;

use super::{load_config, shutdown_signal};

/// Run the watch command.
///
/// Watches the content directory and prints each change until Ctrl+C.
pub async fn run(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let content_dir = &config.server.content_dir;
    tracing::info!(?content_dir, "Starting content watcher");

    let (tx, mut rx) = broadcast::channel::<ContentChange>(64);
    let mut watcher =
        ContentWatcher::spawn(content_dir, tx).wrap_err("Failed to start content watcher")?;

    println!();
    println!("  Watching {} for changes", content_dir.display());
    println!("  Press Ctrl+C to stop");
    println!();

    let report = async {
        loop {
            match rx.recv().await {
                Ok(change) => println!(
                    "  {:<8} {:<14} {}",
                    change.change.as_str(),
                    change.kind.as_str(),
                    change.path
                ),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Content watcher fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    tokio::select! {
        () = report => {}
        () = shutdown_signal() => {}
    }

    watcher.stop();
    Ok(())
}
