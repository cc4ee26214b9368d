//! Hausset CLI Library
//!
//! Command implementations for the `hausset` binary: the content API server,
//! the content watcher, content checks, content resolution and the deploy
//! helper.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (serve, watch, check, resolve, deploy)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use hausset::cmd;
//!
//! # fn main() -> color_eyre::eyre::Result<()> {
//! // Validate configuration and content files
//! cmd::check::run(Path::new("hausset.toml"), false)?;
//! # Ok(())
//! # }
//! ```

pub mod cmd;

pub use hausset_content::{ContentResolver, Tier};
pub use hausset_core::{Config, ContentBundle, Environment};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
