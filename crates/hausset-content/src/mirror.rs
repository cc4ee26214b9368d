//! Remote static mirror of the three content documents.

use hausset_core::{ContentBundle, MirrorConfig, Problem, ProductCatalog, SiteConfig};
use tracing::debug;

use crate::{client::fetch_json, error::Result};

/// Three independently hosted JSON documents that together form a bundle.
#[derive(Debug, Clone)]
pub struct RemoteMirror {
    http: reqwest::Client,
    urls: MirrorConfig,
}

impl RemoteMirror {
    pub fn new(http: reqwest::Client, urls: MirrorConfig) -> Self {
        Self { http, urls }
    }

    pub fn urls(&self) -> &MirrorConfig {
        &self.urls
    }

    /// Fetch all three documents concurrently.
    ///
    /// The first failure aborts the join; documents that already arrived are
    /// dropped with it, so the result is either a whole bundle or an error.
    pub async fn fetch_bundle(&self) -> Result<ContentBundle> {
        let (config, problems, products) = tokio::try_join!(
            fetch_json::<SiteConfig>(&self.http, &self.urls.config_url),
            fetch_json::<Vec<Problem>>(&self.http, &self.urls.problems_url),
            fetch_json::<ProductCatalog>(&self.http, &self.urls.products_url),
        )?;

        debug!(
            problems = problems.len(),
            products = products.len(),
            "mirror documents joined"
        );
        Ok(ContentBundle::from_sections(config, problems, products))
    }
}
