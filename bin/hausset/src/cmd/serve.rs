//! Serve command - content API, contact relay and built front-end

use std::{path::Path, sync::Arc};

use color_eyre::eyre::{Result, WrapErr};
use hausset_core::{Config, Environment};
use hausset_server::{AppState, ContentStore, ContentWatcher, Mailer, create_router, serve};
use tokio::net::TcpListener;

use super::{load_config, shutdown_signal};

/// Run the serve command.
pub async fn run(config_path: &Path, port: Option<u16>, watch: bool, open: bool) -> Result<()> {
    tracing::info!(?config_path, ?port, watch, "Starting server");

    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }

    serve_config(&config, watch, open).await
}

/// Serve with an already loaded configuration until Ctrl+C.
pub async fn serve_config(config: &Config, watch: bool, open: bool) -> Result<()> {
    let warnings = content_warnings(&ContentStore::new(&config.server.content_dir));
    if !warnings.is_empty() {
        println!();
        println!("  Warnings:");
        for warn in &warnings {
            println!("  ⚠ {warn}");
        }
    }

    let state = Arc::new(AppState::from_config(config));
    if let Mailer::Unavailable(reason) = state.mailer() {
        tracing::warn!(%reason, "contact form will report the email service unavailable");
    }

    // Dropped (and stopped) when the server returns.
    let _watcher = if watch {
        let watcher = ContentWatcher::spawn(&config.server.content_dir, state.events())
            .wrap_err("Failed to start content watcher")?;
        tracing::debug!(dir = %watcher.root().display(), "Watching content directory");
        Some(watcher)
    } else {
        None
    };

    let app = create_router(state);
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind to {addr}"))?;

    let url = format!("http://{addr}");
    println!();
    println!("  Hausset server running at {url} ({})", config.environment);
    println!("  Content API:  {url}/api/content/all");
    if config.environment == Environment::Local {
        println!("  Email check:  {url}/api/contact/test-email");
    }
    if watch {
        println!("  Live changes: {url}/api/content/events");
    }
    println!("  Press Ctrl+C to stop");
    println!();

    if open {
        let _ = open::that(&url);
    }

    serve(listener, app, shutdown_signal())
        .await
        .wrap_err("Server error")?;

    Ok(())
}

/// Problems with the content documents, as human-readable lines.
pub(crate) fn content_warnings(store: &ContentStore) -> Vec<String> {
    store
        .validate()
        .into_iter()
        .filter_map(|(path, problem)| problem.map(|p| format!("{}: {p}", path.display())))
        .collect()
}
