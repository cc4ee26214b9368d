//! Content directory watcher.

use std::{
    fmt,
    path::{Component, Path, PathBuf},
};

use notify::{
    EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{ModifyKind, RenameMode},
};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Paths nested deeper than this under the content directory are ignored.
const MAX_DEPTH: usize = 3;

/// Watcher errors.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("content directory does not exist: {0}")]
    MissingDirectory(PathBuf),

    #[error("failed to watch content directory: {0}")]
    Notify(#[from] notify::Error),
}

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Changed,
    Removed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Changed => "changed",
            Self::Removed => "removed",
        }
    }

    fn from_event(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                Some(Self::Added)
            }
            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                Some(Self::Removed)
            }
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(_) => Some(Self::Changed),
            _ => None,
        }
    }
}

/// Content area a file belongs to, by its first path component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Configuration,
    Problems,
    Products,
    Assets,
    Unknown,
}

impl ContentKind {
    /// Classify a path relative to the content directory.
    pub fn classify(relative: &Path) -> Self {
        let first = relative.components().next().and_then(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        });
        match first {
            Some("config") => Self::Configuration,
            Some("problems") => Self::Problems,
            Some("products") => Self::Products,
            Some("images") => Self::Assets,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Problems => "problems",
            Self::Products => "products",
            Self::Assets => "assets",
            Self::Unknown => "unknown",
        }
    }
}

/// A change to one file under the content directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentChange {
    pub change: ChangeKind,
    pub kind: ContentKind,
    /// Path relative to the content directory, with `/` separators.
    pub path: String,
}

impl fmt::Display for ContentChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.path)
    }
}

/// Whether a relative path should produce events.
fn is_watched(relative: &Path) -> bool {
    let mut depth = 0;
    for component in relative.components() {
        let Component::Normal(name) = component else {
            return false;
        };
        if name.to_string_lossy().starts_with('.') {
            return false;
        }
        depth += 1;
    }
    depth > 0 && depth <= MAX_DEPTH
}

/// Turn one filesystem event path into a change, if it is of interest.
fn to_change(root: &Path, path: &Path, change: ChangeKind) -> Option<ContentChange> {
    let relative = path.strip_prefix(root).ok()?;
    if !is_watched(relative) {
        return None;
    }
    let display = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    Some(ContentChange {
        change,
        kind: ContentKind::classify(relative),
        path: display,
    })
}

/// Watches the content directory and broadcasts [`ContentChange`]s.
///
/// Watching stops when [`ContentWatcher::stop`] is called or the value is
/// dropped. Files present at startup produce no events.
pub struct ContentWatcher {
    root: PathBuf,
    watcher: Option<RecommendedWatcher>,
}

impl ContentWatcher {
    pub fn spawn(
        content_dir: &Path,
        sender: broadcast::Sender<ContentChange>,
    ) -> Result<Self, WatchError> {
        if !content_dir.is_dir() {
            return Err(WatchError::MissingDirectory(content_dir.to_path_buf()));
        }
        // Events carry absolute paths.
        let root = content_dir
            .canonicalize()
            .unwrap_or_else(|_| content_dir.to_path_buf());
        let event_root = root.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    let Some(change) = ChangeKind::from_event(&event.kind) else {
                        return;
                    };
                    for path in &event.paths {
                        let Some(change) = to_change(&event_root, path, change) else {
                            continue;
                        };
                        info!(
                            change = change.change.as_str(),
                            kind = change.kind.as_str(),
                            path = %change.path,
                            "content {}",
                            change.change.as_str()
                        );
                        // No subscribers is fine.
                        let _ = sender.send(change);
                    }
                }
                Err(e) => warn!(error = %e, "content watcher error"),
            },
            notify::Config::default(),
        )?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        debug!(dir = %root.display(), "watching content directory");

        Ok(Self {
            root,
            watcher: Some(watcher),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }

    /// Stop watching. Further calls do nothing.
    pub fn stop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.unwatch(&self.root) {
                debug!(error = %e, "unwatch failed");
            }
            info!(dir = %self.root.display(), "content watcher stopped");
        }
    }
}

impl fmt::Debug for ContentWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentWatcher")
            .field("root", &self.root)
            .field("running", &self.is_running())
            .finish()
    }
}

impl Drop for ContentWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            ContentKind::classify(Path::new("config/site.json")),
            ContentKind::Configuration
        );
        assert_eq!(
            ContentKind::classify(Path::new("problems/problems.json")),
            ContentKind::Problems
        );
        assert_eq!(
            ContentKind::classify(Path::new("products/screenshots.json")),
            ContentKind::Products
        );
        assert_eq!(
            ContentKind::classify(Path::new("images/hero.png")),
            ContentKind::Assets
        );
        assert_eq!(
            ContentKind::classify(Path::new("notes.txt")),
            ContentKind::Unknown
        );
    }

    #[test]
    fn test_dotfiles_and_deep_paths_ignored() {
        assert!(is_watched(Path::new("config/site.json")));
        assert!(is_watched(Path::new("images/a/b.png")));
        assert!(!is_watched(Path::new("images/a/b/c.png")));
        assert!(!is_watched(Path::new(".DS_Store")));
        assert!(!is_watched(Path::new("config/.site.json.swp")));
        assert!(!is_watched(Path::new(".git/config")));
        assert!(!is_watched(Path::new("")));
    }

    #[test]
    fn test_to_change() {
        let root = Path::new("/srv/content");
        let change = to_change(
            root,
            Path::new("/srv/content/problems/problems.json"),
            ChangeKind::Changed,
        )
        .expect("watched");
        assert_eq!(change.kind, ContentKind::Problems);
        assert_eq!(change.path, "problems/problems.json");
        assert_eq!(change.to_string(), "problems:problems/problems.json");

        assert!(to_change(root, Path::new("/elsewhere/x.json"), ChangeKind::Added).is_none());
    }

    #[test]
    fn test_change_kind_from_event() {
        use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};

        assert_eq!(
            ChangeKind::from_event(&EventKind::Create(CreateKind::File)),
            Some(ChangeKind::Added)
        );
        assert_eq!(
            ChangeKind::from_event(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(ChangeKind::Changed)
        );
        assert_eq!(
            ChangeKind::from_event(&EventKind::Remove(RemoveKind::File)),
            Some(ChangeKind::Removed)
        );
        assert_eq!(
            ChangeKind::from_event(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))),
            None
        );
    }

    #[test]
    fn test_spawn_requires_directory() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let (tx, _rx) = broadcast::channel(4);
        let err = ContentWatcher::spawn(&dir.path().join("missing"), tx).expect_err("missing");
        assert!(matches!(err, WatchError::MissingDirectory(_)));
    }

    #[tokio::test]
    async fn test_watcher_broadcasts_changes() {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("config")).expect("mkdir");

        let (tx, mut rx) = broadcast::channel(16);
        let mut watcher = ContentWatcher::spawn(dir.path(), tx).expect("spawn");
        assert!(watcher.is_running());

        std::fs::write(dir.path().join("config/site.json"), "{}").expect("write");

        let change = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event in time")
            .expect("event");
        assert_eq!(change.kind, ContentKind::Configuration);
        assert_eq!(change.path, "config/site.json");

        watcher.stop();
        assert!(!watcher.is_running());
    }
}
