//! File-backed content store.
//!
//! Serves the JSON documents under the content directory as they are on disk.
//! The store does not reshape documents; [`ContentStore::validate`] checks
//! them against the content model for the CLI.

use std::path::{Path, PathBuf};

use chrono::Utc;
use hausset_core::{
    ImageAsset, ImageList, Problem, ProductCatalog, SiteConfig, content::parse_document,
};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

/// Image extensions listed by `/api/content/images`.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "svg", "webp"];

/// Content store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The section file is missing or is not valid JSON.
    #[error("{} not found", .0.label())]
    NotFound(Section),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// One of the three content documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Config,
    Problems,
    Products,
}

impl Section {
    pub const ALL: [Section; 3] = [Self::Config, Self::Problems, Self::Products];

    /// Path relative to the content directory.
    pub fn relative_path(&self) -> &'static str {
        match self {
            Self::Config => "config/site.json",
            Self::Problems => "problems/problems.json",
            Self::Products => "products/screenshots.json",
        }
    }

    /// Human label used in error bodies.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config => "Site configuration",
            Self::Problems => "Problems data",
            Self::Products => "Products data",
        }
    }

    /// Value used by `/api/content/all` when the document is unavailable.
    fn empty(&self) -> Value {
        match self {
            Self::Config => json!({}),
            Self::Problems | Self::Products => json!([]),
        }
    }
}

/// Read access to a content directory.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    pub fn section_path(&self, section: Section) -> PathBuf {
        self.root.join(section.relative_path())
    }

    /// Read a section document as raw JSON.
    pub async fn read_section(&self, section: Section) -> Result<Value> {
        let path = self.section_path(section);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read content file");
                return Err(StoreError::NotFound(section));
            }
        };

        serde_json::from_str(&text).map_err(|e| {
            warn!(path = %path.display(), error = %e, "content file is not valid JSON");
            StoreError::NotFound(section)
        })
    }

    /// Read all three sections concurrently.
    ///
    /// Unavailable sections are replaced by an empty object or list; clients
    /// decide whether the result is usable.
    pub async fn read_all(&self) -> Value {
        let (config, problems, products) = tokio::join!(
            self.read_section(Section::Config),
            self.read_section(Section::Problems),
            self.read_section(Section::Products),
        );

        json!({
            "config": config.unwrap_or_else(|_| Section::Config.empty()),
            "problems": problems.unwrap_or_else(|_| Section::Problems.empty()),
            "products": products.unwrap_or_else(|_| Section::Products.empty()),
            "lastUpdated": Utc::now().to_rfc3339(),
        })
    }

    /// List images directly under `images/`, sorted by name.
    pub async fn list_images(&self) -> Result<ImageList> {
        let dir = self.images_dir();
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            debug!(dir = %dir.display(), "no images directory");
            return Ok(ImageList::default());
        }

        let mut entries = tokio::fs::read_dir(&dir).await?;
        let mut images = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !is_image(&name) {
                continue;
            }
            images.push(ImageAsset {
                url: format!("/content/images/{name}"),
                path: format!("images/{name}"),
                name,
            });
        }

        images.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(ImageList { images })
    }

    /// Check every section parses and matches the content model.
    ///
    /// Returns one entry per section: the file path and the problem, if any.
    pub fn validate(&self) -> Vec<(PathBuf, Option<String>)> {
        Section::ALL
            .iter()
            .map(|&section| {
                let path = self.section_path(section);
                let problem = validate_file(section, &path).err();
                (path, problem)
            })
            .collect()
    }
}

/// Check one section document on disk.
pub fn validate_file(section: Section, path: &Path) -> std::result::Result<(), String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read: {e}"))?;
    let checked = match section {
        Section::Config => parse_document::<SiteConfig>(path, &text).map(|_| ()),
        Section::Problems => parse_document::<Vec<Problem>>(path, &text).map(|_| ()),
        Section::Products => parse_document::<ProductCatalog>(path, &text).map(|_| ()),
    };
    checked.map_err(|e| e.to_string())
}

/// Check that a file holds syntactically valid JSON.
pub fn validate_json_syntax(path: &Path) -> std::result::Result<(), String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read: {e}"))?;
    serde_json::from_str::<Value>(&text)
        .map(|_| ())
        .map_err(|e| format!("Invalid JSON in {}: {e}", path.display()))
}

fn is_image(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use hausset_core::ContentBundle;

    use super::*;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, content).expect("write");
    }

    fn write_bundled(root: &Path) {
        let bundle = ContentBundle::bundled();
        write(
            root,
            "config/site.json",
            &serde_json::to_string(&bundle.config).expect("json"),
        );
        write(
            root,
            "problems/problems.json",
            &serde_json::to_string(&bundle.problems).expect("json"),
        );
        write(
            root,
            "products/screenshots.json",
            &serde_json::to_string(&bundle.products).expect("json"),
        );
    }

    #[test]
    fn test_is_image() {
        assert!(is_image("hero.JPG"));
        assert!(is_image("logo.svg"));
        assert!(!is_image("notes.txt"));
        assert!(!is_image("noext"));
    }

    #[tokio::test]
    async fn test_read_section_passes_document_through() {
        let dir = tempfile::tempdir().expect("create temp dir");
        write(dir.path(), "problems/problems.json", r#"[{"anything": 1}]"#);

        let store = ContentStore::new(dir.path());
        let value = store.read_section(Section::Problems).await.expect("read");
        assert_eq!(value, json!([{"anything": 1}]));
    }

    #[tokio::test]
    async fn test_missing_section_is_not_found() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = ContentStore::new(dir.path());

        let err = store.read_section(Section::Config).await.expect_err("missing");
        assert!(matches!(err, StoreError::NotFound(Section::Config)));
        assert_eq!(err.to_string(), "Site configuration not found");
    }

    #[tokio::test]
    async fn test_invalid_json_is_not_found() {
        let dir = tempfile::tempdir().expect("create temp dir");
        write(dir.path(), "products/screenshots.json", "{ nope");
        let store = ContentStore::new(dir.path());

        assert!(store.read_section(Section::Products).await.is_err());
    }

    #[tokio::test]
    async fn test_read_all_defaults_missing_sections() {
        let dir = tempfile::tempdir().expect("create temp dir");
        write(dir.path(), "problems/problems.json", r#"[{"id": "p"}]"#);
        let store = ContentStore::new(dir.path());

        let all = store.read_all().await;
        assert_eq!(all["config"], json!({}));
        assert_eq!(all["problems"], json!([{"id": "p"}]));
        assert_eq!(all["products"], json!([]));
        assert!(all["lastUpdated"].is_string());
    }

    #[tokio::test]
    async fn test_list_images_filters_and_sorts() {
        let dir = tempfile::tempdir().expect("create temp dir");
        write(dir.path(), "images/b.png", "");
        write(dir.path(), "images/a.WEBP", "");
        write(dir.path(), "images/readme.md", "");
        fs::create_dir_all(dir.path().join("images/nested.png")).expect("mkdir");

        let store = ContentStore::new(dir.path());
        let list = store.list_images().await.expect("list");
        let names: Vec<_> = list.images.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["a.WEBP", "b.png"]);
        assert_eq!(list.images[1].url, "/content/images/b.png");
        assert_eq!(list.images[1].path, "images/b.png");
    }

    #[tokio::test]
    async fn test_list_images_without_directory() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = ContentStore::new(dir.path());
        assert!(store.list_images().await.expect("list").images.is_empty());
    }

    #[test]
    fn test_validate_accepts_model_documents() {
        let dir = tempfile::tempdir().expect("create temp dir");
        write_bundled(dir.path());

        let store = ContentStore::new(dir.path());
        assert!(store.validate().iter().all(|(_, problem)| problem.is_none()));
    }

    #[test]
    fn test_validate_reports_shape_errors() {
        let dir = tempfile::tempdir().expect("create temp dir");
        write_bundled(dir.path());
        write(dir.path(), "config/site.json", r#"{"company": {}}"#);

        let store = ContentStore::new(dir.path());
        let report = store.validate();
        assert!(report[0].1.is_some());
        assert!(report[1].1.is_none());
        assert!(report[2].1.is_none());
    }

    #[test]
    fn test_validate_json_syntax() {
        let dir = tempfile::tempdir().expect("create temp dir");
        write(dir.path(), "ok.json", "[1, 2]");
        write(dir.path(), "bad.json", "[1, 2");

        assert!(validate_json_syntax(&dir.path().join("ok.json")).is_ok());
        let err = validate_json_syntax(&dir.path().join("bad.json")).expect_err("bad");
        assert!(err.contains("Invalid JSON in"));
    }
}
