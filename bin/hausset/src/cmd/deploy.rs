//! Deploy command - validate content, build the client and serve

use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use color_eyre::eyre::{Result, WrapErr, bail};
use hausset_core::{Config, DeployConfig};
use hausset_server::{ContentStore, store::validate_json_syntax};
use notify::{
    EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{ModifyKind, RenameMode},
};
use tokio::{process::Command, sync::mpsc};

use super::{load_config, serve::serve_config};

/// Run the deploy command.
pub async fn run(config_path: &Path, watch: bool, skip_build: bool) -> Result<()> {
    tracing::info!(?config_path, watch, skip_build, "Starting deployment");

    let config = load_config(config_path)?;

    println!("Validating content...");
    validate_content(&ContentStore::new(&config.server.content_dir))?;
    println!("  ✓ Content documents valid");

    check_client(&config.deploy)?;

    if skip_build {
        println!("Skipping client build");
    } else {
        run_build(&config.deploy).await?;
    }

    // Dropped (and stopped) when the server returns.
    let _watcher = if watch {
        Some(spawn_rebuild_watcher(&config)?)
    } else {
        None
    };

    serve_config(&config, watch, false).await
}

/// Fail unless all three content documents parse and match the model.
fn validate_content(store: &ContentStore) -> Result<()> {
    let problems: Vec<String> = store
        .validate()
        .into_iter()
        .filter_map(|(path, problem)| problem.map(|p| format!("{}: {p}", path.display())))
        .collect();

    if problems.is_empty() {
        return Ok(());
    }
    for problem in &problems {
        println!("  ✗ {problem}");
    }
    bail!("Content validation failed with {} error(s)", problems.len());
}

/// Check the client project is ready to build.
fn check_client(deploy: &DeployConfig) -> Result<()> {
    if !deploy.client_dir.is_dir() {
        bail!(
            "Client directory not found: {}",
            deploy.client_dir.display()
        );
    }
    if !deploy.client_dir.join("node_modules").is_dir() {
        bail!(
            "Client dependencies missing in {}. Run `npm install` there first.",
            deploy.client_dir.display()
        );
    }
    Ok(())
}

/// Run the configured build command in the client directory.
async fn run_build(deploy: &DeployConfig) -> Result<()> {
    println!(
        "Building client: {} (in {})",
        deploy.build_command,
        deploy.client_dir.display()
    );
    let start = Instant::now();

    let status = shell(&deploy.build_command)
        .current_dir(&deploy.client_dir)
        .status()
        .await
        .wrap_err_with(|| format!("Failed to run `{}`", deploy.build_command))?;

    if !status.success() {
        bail!("Client build failed ({status})");
    }

    println!("  ✓ Client built in {}ms", start.elapsed().as_millis());
    Ok(())
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// Watch content JSON files and rebuild the client when they change.
fn spawn_rebuild_watcher(config: &Config) -> Result<RecommendedWatcher> {
    let (tx, rx) = mpsc::channel::<PathBuf>(64);

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                for path in rebuild_paths(&event) {
                    let _ = tx.blocking_send(path);
                }
            }
        },
        notify::Config::default(),
    )
    .wrap_err("Failed to create file watcher")?;

    watcher
        .watch(&config.server.content_dir, RecursiveMode::Recursive)
        .wrap_err("Failed to watch content directory")?;
    println!(
        "Watching {} for content changes",
        config.server.content_dir.display()
    );

    let deploy = config.deploy.clone();
    let debounce = Duration::from_millis(deploy.debounce_ms);
    tokio::spawn(rebuild_loop(rx, debounce, move |changed| {
        let deploy = deploy.clone();
        async move { rebuild(&deploy, &changed).await }
    }));

    Ok(watcher)
}

/// Paths in a watcher event that should rebuild the client.
///
/// Writes, creations and rename targets of visible `.json` files count.
/// Editors that save atomically rename a temp file over the document.
fn rebuild_paths(event: &notify::Event) -> Vec<PathBuf> {
    let candidates: &[PathBuf] = match event.kind {
        EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Any)
        | EventKind::Modify(ModifyKind::Name(RenameMode::To))
        | EventKind::Create(_) => &event.paths[..],
        // `paths` is `[from, to]`.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.last().map(std::slice::from_ref).unwrap_or_default()
        }
        _ => &[],
    };

    candidates
        .iter()
        .filter(|path| is_visible_json(path))
        .cloned()
        .collect()
}

fn is_visible_json(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_none_or(|name| name.starts_with('.'));
    !hidden && path.extension().is_some_and(|ext| ext == "json")
}

async fn rebuild(deploy: &DeployConfig, changed: &[PathBuf]) {
    for path in changed {
        if let Err(e) = validate_json_syntax(path) {
            tracing::error!("{e}");
            eprintln!("  ✗ {e}, skipping rebuild");
            return;
        }
        println!("  Content changed: {}", path.display());
    }

    if let Err(e) = run_build(deploy).await {
        tracing::error!("Rebuild failed: {e}");
        eprintln!("  ✗ Rebuild failed: {e}");
    }
}

/// Debounce change notifications into builds.
///
/// A build starts once no change has arrived for `debounce`. Changes that
/// arrive while a build runs are folded into exactly one follow-up build.
/// Returns when the sender side closes.
async fn rebuild_loop<F, Fut>(mut rx: mpsc::Receiver<PathBuf>, debounce: Duration, mut build: F)
where
    F: FnMut(Vec<PathBuf>) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut pending: Vec<PathBuf> = Vec::new();

    loop {
        if pending.is_empty() {
            match rx.recv().await {
                Some(path) => pending.push(path),
                None => return,
            }
        }

        // Wait for a quiet period.
        let mut closed = false;
        loop {
            match tokio::time::timeout(debounce, rx.recv()).await {
                Ok(Some(path)) => pending.push(path),
                Ok(None) => {
                    closed = true;
                    break;
                }
                Err(_) => break,
            }
        }

        pending.sort();
        pending.dedup();
        build(std::mem::take(&mut pending)).await;

        // Everything that queued up during the build becomes one follow-up.
        while let Ok(path) = rx.try_recv() {
            pending.push(path);
        }

        if closed && pending.is_empty() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use super::*;

    fn event(kind: EventKind, paths: &[&str]) -> notify::Event {
        paths
            .iter()
            .fold(notify::Event::new(kind), |event, path| event.add_path(PathBuf::from(path)))
    }

    #[test]
    fn test_rebuild_paths_for_writes_and_renames() {
        use notify::event::{CreateKind, DataChange};

        let site = "content/config/site.json";
        let expected = vec![PathBuf::from(site)];
        let write = EventKind::Modify(ModifyKind::Data(DataChange::Content));

        assert_eq!(rebuild_paths(&event(write, &[site])), expected);
        assert_eq!(
            rebuild_paths(&event(EventKind::Create(CreateKind::File), &[site])),
            expected
        );
        assert_eq!(
            rebuild_paths(&event(
                EventKind::Modify(ModifyKind::Name(RenameMode::To)),
                &[site]
            )),
            expected
        );
        assert_eq!(
            rebuild_paths(&event(
                EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
                &["content/config/site.json.tmp", site]
            )),
            expected
        );
    }

    #[test]
    fn test_rebuild_paths_skip_hidden_and_removed_files() {
        use notify::event::{DataChange, RemoveKind};

        let write = EventKind::Modify(ModifyKind::Data(DataChange::Content));
        let removed = EventKind::Remove(RemoveKind::File);
        let renamed_away = EventKind::Modify(ModifyKind::Name(RenameMode::From));

        assert!(rebuild_paths(&event(removed, &["content/config/site.json"])).is_empty());
        assert!(rebuild_paths(&event(renamed_away, &["content/config/site.json"])).is_empty());
        assert!(rebuild_paths(&event(write, &["content/images/hero.png"])).is_empty());
        assert!(rebuild_paths(&event(write, &["content/config/.site.json"])).is_empty());
        assert!(rebuild_paths(&event(write, &["content/problems/.json"])).is_empty());
    }

    #[test]
    fn test_check_client_requires_node_modules() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let deploy = DeployConfig {
            client_dir: dir.path().to_path_buf(),
            ..DeployConfig::default()
        };

        let err = check_client(&deploy).expect_err("no node_modules");
        assert!(err.to_string().contains("npm install"));

        fs::create_dir(dir.path().join("node_modules")).expect("mkdir");
        assert!(check_client(&deploy).is_ok());
    }

    #[test]
    fn test_validate_content_fails_on_missing_documents() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = validate_content(&ContentStore::new(dir.path())).expect_err("missing");
        assert!(err.to_string().contains("3 error(s)"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_build_reports_failure() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let ok = DeployConfig {
            client_dir: dir.path().to_path_buf(),
            build_command: "echo built > out.txt".to_string(),
            ..DeployConfig::default()
        };
        run_build(&ok).await.expect("build");
        assert!(dir.path().join("out.txt").exists());

        let failing = DeployConfig {
            build_command: "exit 3".to_string(),
            ..ok
        };
        assert!(run_build(&failing).await.is_err());
    }

    #[tokio::test]
    async fn test_rebuild_loop_debounces_burst() {
        let (tx, rx) = mpsc::channel(16);
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();

        let handle = tokio::spawn(rebuild_loop(rx, Duration::from_millis(50), move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }));

        for name in ["a.json", "b.json", "a.json"] {
            tx.send(PathBuf::from(name)).await.expect("send");
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
        drop(tx);
        handle.await.expect("loop");

        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_changes_during_build_queue_one_follow_up() {
        let (tx, rx) = mpsc::channel(16);
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();

        let handle = tokio::spawn(rebuild_loop(rx, Duration::from_millis(20), move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
        }));

        tx.send(PathBuf::from("site.json")).await.expect("send");
        // First build is running by now.
        tokio::time::sleep(Duration::from_millis(120)).await;
        tx.send(PathBuf::from("problems.json")).await.expect("send");
        tx.send(PathBuf::from("screenshots.json")).await.expect("send");

        tokio::time::sleep(Duration::from_millis(900)).await;
        drop(tx);
        handle.await.expect("loop");

        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }
}
