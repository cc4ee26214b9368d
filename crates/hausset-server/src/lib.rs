//! Hausset Server
//!
//! Content API, contact relay and content watcher for the Hausset site.
//!
//! # Modules
//!
//! - [`store`] - File-backed content documents and image listing
//! - [`server`] - Axum router, shared state and event stream
//! - [`contact`] - Contact submissions to email
//! - [`mail`] - Mail transports
//! - [`rate_limit`] - Per-client submission limits
//! - [`watcher`] - Content directory watcher
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use hausset_core::Config;
//! use hausset_server::{AppState, create_router, serve};
//!
//! # async fn run() -> std::io::Result<()> {
//! let config = Config::default();
//! let router = create_router(Arc::new(AppState::from_config(&config)));
//! let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
//! serve(listener, router, async {
//!     let _ = tokio::signal::ctrl_c().await;
//! })
//! .await
//! # }
//! ```

pub mod contact;
pub mod mail;
pub mod rate_limit;
pub mod server;
pub mod store;
pub mod watcher;

pub use contact::{ContactRelay, RelayError};
pub use mail::{MailError, Mailer, OutgoingEmail, Outbox};
pub use rate_limit::RateLimiter;
pub use server::{AppState, ClientIp, create_router, serve};
pub use store::{ContentStore, Section, StoreError};
pub use watcher::{ChangeKind, ContentChange, ContentKind, ContentWatcher, WatchError};
