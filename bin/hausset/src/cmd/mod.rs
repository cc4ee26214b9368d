//! Command implementations.

pub mod check;
pub mod deploy;
pub mod resolve;
pub mod serve;
pub mod watch;

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use hausset_core::Config;

/// Load configuration for long-running commands.
///
/// The file is optional; `HAUSSET__*` environment variables override it.
pub(crate) fn load_config(config_path: &Path) -> Result<Config> {
    Config::load_with_env(config_path).wrap_err("Failed to load configuration")
}

/// Wait for Ctrl+C.
pub(crate) async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    println!();
    println!("  Shutting down...");
}
