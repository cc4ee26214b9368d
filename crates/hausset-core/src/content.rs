//! Content types and structures.
//!
//! A [`ContentBundle`] is everything the page needs to render: the site
//! configuration, the ordered problem statements and the product showcase.
//! The types are strict on purpose: a body that does not deserialize into the
//! full model is rejected as a whole rather than rendered half-filled.

use std::{collections::BTreeMap, path::Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// Everything needed to render the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBundle {
    /// Site, company, theme and contact metadata.
    pub config: SiteConfig,

    /// Problem statements, in display order.
    pub problems: Vec<Problem>,

    /// Product showcase.
    pub products: ProductCatalog,

    /// Set by the content API when it assembled the bundle.
    #[serde(
        rename = "lastUpdated",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<DateTime<Utc>>,

    /// Top-level keys outside the model. Served bundles round-trip unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentBundle {
    /// Assemble a bundle from its three sections.
    #[must_use]
    pub fn from_sections(
        config: SiteConfig,
        problems: Vec<Problem>,
        products: ProductCatalog,
    ) -> Self {
        Self {
            config,
            problems,
            products,
            last_updated: None,
            extra: Map::new(),
        }
    }
}

/// Site-level configuration document (`config/site.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub company: CompanyInfo,

    pub hero: HeroSection,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social: Option<SocialLinks>,

    #[serde(default)]
    pub theme: Theme,
    /// Keys outside the model, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Company identity shown in the header and footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub tagline: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Hero section copy and call to action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroSection {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub cta_text: String,
    pub cta_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Public contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Social links. Unknown networks are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub other: BTreeMap<String, String>,
}

/// Theme colours applied as CSS variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default = "default_text_color")]
    pub text_color: String,
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_primary_color() -> String {
    "#4285f4".to_string()
}

fn default_background_color() -> String {
    "#0a0a0a".to_string()
}

fn default_text_color() -> String {
    "#ffffff".to_string()
}

fn default_accent_color() -> String {
    "#ff6b47".to_string()
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: default_primary_color(),
            background_color: default_background_color(),
            text_color: default_text_color(),
            accent_color: default_accent_color(),
            extra: Map::new(),
        }
    }
}

/// A problem statement (`problems/problems.json` entries).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A product screen or feature (`products/screenshots.json` entries).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The products document: either a plain list or a titled feature list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductCatalog {
    /// `[ {product}, ... ]`
    List(Vec<Product>),
    /// `{ "title": ..., "features": [ {product}, ... ] }`
    Showcase(ProductShowcase),
}

/// Feature-list variant of the products document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductShowcase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub features: Vec<Product>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductCatalog {
    /// Products in display order, whichever shape was read.
    #[must_use]
    pub fn items(&self) -> &[Product] {
        match self {
            Self::List(products) => products,
            Self::Showcase(showcase) => &showcase.features,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

/// Parse one content document from JSON text.
///
/// `path` is only used for the error message.
pub fn parse_document<T: DeserializeOwned>(path: &Path, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| CoreError::content(path, e.to_string()))
}

/// Read and parse one content document from disk.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    parse_document(path, &text)
}
