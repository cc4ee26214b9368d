//! Hausset Core Library
//!
//! Content model, contact validation, configuration and error handling shared
//! by the content client, the API server and the CLI.

pub mod api;
pub mod bundled;
pub mod config;
pub mod contact;
pub mod content;
pub mod error;

pub use api::{ErrorBody, HealthStatus, ImageAsset, ImageList};
pub use config::{
    Config, ContactConfig, DeployConfig, Environment, MailConfig, MailProvider, MirrorConfig,
    RateLimitConfig, ServerConfig, SourceConfig,
};
pub use contact::{ContactReceipt, ContactSubmission, FieldError, ValidationErrors};
pub use content::{
    Address, CompanyInfo, ContactInfo, ContentBundle, HeroSection, Problem, Product,
    ProductCatalog, ProductShowcase, SiteConfig, SocialLinks, Theme,
};
pub use error::{CoreError, Result};
