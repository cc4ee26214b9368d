//! Hausset Content Client
//!
//! Obtains page content through a ranked chain of sources and talks to the
//! contact relay.
//!
//! # Modules
//!
//! - [`client`] - Content API client and contact submission
//! - [`mirror`] - Remote static mirror of the content documents
//! - [`resolver`] - Tiered resolution with all-or-nothing acceptance
//! - [`error`] - Fetch and submission errors
//!
//! # Example
//!
//! ```no_run
//! use hausset_content::ContentResolver;
//! use hausset_core::Config;
//!
//! # async fn run() -> Result<(), hausset_content::ContentError> {
//! let resolver = ContentResolver::from_config(&Config::default())?;
//! let bundle = resolver.resolve_content().await;
//! println!("{}", bundle.config.company.name);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod mirror;
pub mod resolver;

pub use client::ContentClient;
pub use error::{ContentError, Result, SubmitError};
pub use mirror::RemoteMirror;
pub use resolver::{ContentResolver, Resolved, Tier};
