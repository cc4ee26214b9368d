//! Tiered content resolution.
//!
//! Content comes from the first tier that answers in full:
//!
//! 1. the content API (`/content/all`),
//! 2. the remote static mirror, only in a deployed environment with a mirror
//!    configured,
//! 3. the bundled default content, which cannot fail.
//!
//! A tier is accepted whole or not at all; sections from different tiers are
//! never combined.

use std::fmt;

use hausset_core::{Config, ContentBundle, Environment};
use tracing::{info, warn};

use crate::{
    client::ContentClient,
    error::Result,
    mirror::RemoteMirror,
};

/// A ranked content source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// The live content API.
    LocalApi,
    /// The remote static mirror.
    RemoteMirror,
    /// Content compiled into the binary.
    Bundled,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LocalApi => "local-api",
            Self::RemoteMirror => "remote-mirror",
            Self::Bundled => "bundled",
        })
    }
}

/// A resolved bundle and the tier that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub bundle: ContentBundle,
    pub tier: Tier,
}

/// Resolves a [`ContentBundle`] through the tier chain.
#[derive(Debug, Clone)]
pub struct ContentResolver {
    client: ContentClient,
    mirror: Option<RemoteMirror>,
    environment: Environment,
    fallback: ContentBundle,
}

impl ContentResolver {
    /// A resolver with no mirror and the bundled default content.
    pub fn new(client: ContentClient, environment: Environment) -> Self {
        Self {
            client,
            mirror: None,
            environment,
            fallback: ContentBundle::bundled(),
        }
    }

    /// Add the remote mirror tier.
    #[must_use]
    pub fn with_mirror(mut self, mirror: RemoteMirror) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Replace the last-resort content.
    #[must_use]
    pub fn with_fallback(mut self, fallback: ContentBundle) -> Self {
        self.fallback = fallback;
        self
    }

    /// Build the resolver described by `config`, sharing one HTTP client
    /// between the API and mirror tiers.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ContentClient::from_config(&config.source)?;
        let mirror = config
            .source
            .mirror
            .clone()
            .map(|urls| RemoteMirror::new(client.http().clone(), urls));

        let mut resolver = Self::new(client, config.environment);
        resolver.mirror = mirror;
        Ok(resolver)
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// The mirror, when the environment allows consulting it.
    fn active_mirror(&self) -> Option<&RemoteMirror> {
        match self.environment {
            Environment::Deployed => self.mirror.as_ref(),
            Environment::Local => None,
        }
    }

    /// Resolve content and report which tier answered.
    pub async fn resolve(&self) -> Resolved {
        match self.client.all().await {
            Ok(bundle) => {
                info!(tier = %Tier::LocalApi, "content resolved");
                return Resolved {
                    bundle,
                    tier: Tier::LocalApi,
                };
            }
            Err(e) => {
                warn!(
                    tier = %Tier::LocalApi,
                    url = %self.client.url("content/all"),
                    error = %e,
                    "content tier failed"
                );
            }
        }

        if let Some(mirror) = self.active_mirror() {
            match mirror.fetch_bundle().await {
                Ok(bundle) => {
                    info!(tier = %Tier::RemoteMirror, "content resolved");
                    return Resolved {
                        bundle,
                        tier: Tier::RemoteMirror,
                    };
                }
                Err(e) => {
                    warn!(tier = %Tier::RemoteMirror, error = %e, "content tier failed");
                }
            }
        }

        info!(
            tier = %Tier::Bundled,
            environment = %self.environment,
            "using bundled content"
        );
        Resolved {
            bundle: self.fallback.clone(),
            tier: Tier::Bundled,
        }
    }

    /// Resolve content. Never fails.
    pub async fn resolve_content(&self) -> ContentBundle {
        self.resolve().await.bundle
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_tier_display() {
        assert_eq!(Tier::LocalApi.to_string(), "local-api");
        assert_eq!(Tier::RemoteMirror.to_string(), "remote-mirror");
        assert_eq!(Tier::Bundled.to_string(), "bundled");
    }

    #[test]
    fn test_mirror_ignored_in_local_environment() {
        let mut config = Config::default();
        config.source.mirror = Some(hausset_core::MirrorConfig {
            config_url: "https://cdn.example.com/site.json".to_string(),
            problems_url: "https://cdn.example.com/problems.json".to_string(),
            products_url: "https://cdn.example.com/screenshots.json".to_string(),
        });

        let resolver = ContentResolver::from_config(&config).expect("resolver");
        assert!(resolver.mirror.is_some());
        assert!(resolver.active_mirror().is_none());

        config.environment = Environment::Deployed;
        let resolver = ContentResolver::from_config(&config).expect("resolver");
        assert!(resolver.active_mirror().is_some());
    }

    #[tokio::test]
    async fn test_unreachable_api_falls_back_to_bundled() {
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|l| l.local_addr())
            .expect("free port");
        let client = ContentClient::new(&format!("http://{addr}/api"), Duration::from_secs(2))
            .expect("client");
        let resolved = ContentResolver::new(client, Environment::Local).resolve().await;
        assert_eq!(resolved.tier, Tier::Bundled);
        assert_eq!(resolved.bundle, ContentBundle::bundled());
    }
}
