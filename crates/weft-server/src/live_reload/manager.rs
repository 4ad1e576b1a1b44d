//! Live reload manager.
//!
//! Coordinates file watching, sprite recompilation and WebSocket broadcasting.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use weft_sprite::SpriteCompiler;

use super::debouncer::{EventDebouncer, FsEvent, FsEventKind};
use crate::sprite;

/// Event sent to connected WebSocket clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum ReloadEvent {
    /// A page or partial changed; reload the page.
    Reload {
        /// URL path of the changed file.
        path: String,
    },
    /// The sprite was recompiled.
    Sprite {
        /// Milliseconds since the Unix epoch, used as a cache-busting token.
        timestamp: i64,
    },
}

/// Default debounce duration in milliseconds.
const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// How often the processing task checks the debouncer.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default page patterns, relative to the source directory.
const DEFAULT_WATCH_PATTERNS: &[&str] = &["**/*.html"];

/// What a debounced filesystem event means for connected browsers.
#[derive(Debug, PartialEq, Eq)]
enum Change {
    Icon,
    Page(String),
}

/// Paths and patterns that decide whether a filesystem event matters.
struct WatchScope {
    source_dir: PathBuf,
    icons_dir: PathBuf,
    patterns: Vec<glob::Pattern>,
}

impl WatchScope {
    fn new(source_dir: &Path, icons_dir: &Path, watch_patterns: &[String]) -> Self {
        let patterns = watch_patterns
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(err) => {
                    tracing::warn!(pattern = %p, error = %err, "Ignoring invalid watch pattern");
                    None
                }
            })
            .collect();

        Self {
            source_dir: canonical(source_dir),
            icons_dir: canonical(icons_dir),
            patterns,
        }
    }

    /// Classify a path. Icons take precedence over page patterns.
    fn classify(&self, path: &Path) -> Option<Change> {
        if is_icon(path) && path.starts_with(&self.icons_dir) {
            return Some(Change::Icon);
        }

        let relative = path.strip_prefix(&self.source_dir).ok()?;
        let relative_str = relative.to_string_lossy();
        self.patterns
            .iter()
            .any(|pattern| pattern.matches(&relative_str))
            .then(|| Change::Page(url_path(relative)))
    }

    /// Directories to hand to the watcher. The icons directory is skipped
    /// when it lives inside the source directory.
    fn roots(&self) -> Vec<&Path> {
        let mut roots = vec![self.source_dir.as_path()];
        if self.icons_dir.is_dir() && !self.icons_dir.starts_with(&self.source_dir) {
            roots.push(&self.icons_dir);
        }
        roots
    }
}

/// Manages file watching and broadcasting reload events.
pub(crate) struct LiveReloadManager {
    source_dir: PathBuf,
    watch_patterns: Vec<String>,
    compiler: Arc<SpriteCompiler>,
    broadcaster: broadcast::Sender<ReloadEvent>,
    watcher: Option<RecommendedWatcher>,
    debounce_ms: u64,
}

impl LiveReloadManager {
    /// Create a new live reload manager.
    ///
    /// # Arguments
    ///
    /// * `source_dir` - Site source directory to watch
    /// * `watch_patterns` - Glob patterns for pages (default `["**/*.html"]`)
    /// * `compiler` - Sprite compiler; its icons directory is watched too
    /// * `broadcaster` - Broadcast channel sender for reload events
    #[must_use]
    pub(crate) fn new(
        source_dir: PathBuf,
        watch_patterns: Option<Vec<String>>,
        compiler: Arc<SpriteCompiler>,
        broadcaster: broadcast::Sender<ReloadEvent>,
    ) -> Self {
        Self {
            source_dir,
            watch_patterns: watch_patterns.unwrap_or_else(|| {
                DEFAULT_WATCH_PATTERNS
                    .iter()
                    .map(|p| (*p).to_owned())
                    .collect()
            }),
            compiler,
            broadcaster,
            watcher: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }

    /// Start the file watcher.
    ///
    /// Spawns a task that records raw events into the debouncer and a task
    /// that processes debounced events one batch at a time, so sprite
    /// recompiles never overlap.
    ///
    /// A missing icons directory is created first, so icons added after
    /// startup still trigger a recompile.
    ///
    /// # Errors
    ///
    /// Returns an error if the icons directory or the file watcher cannot be
    /// created.
    pub(crate) fn start(&mut self) -> Result<(), notify::Error> {
        ensure_dir(self.compiler.icons_dir()).map_err(notify::Error::io)?;

        let (tx, mut rx) = mpsc::channel::<Event>(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                // Callback runs on the watcher's own thread
                Ok(event) => {
                    let _ = tx.blocking_send(event);
                }
                Err(err) => tracing::warn!(error = %err, "File watcher error"),
            }
        })?;

        let scope = Arc::new(WatchScope::new(
            &self.source_dir,
            self.compiler.icons_dir(),
            &self.watch_patterns,
        ));
        for root in scope.roots() {
            watcher.watch(root, RecursiveMode::Recursive)?;
            tracing::debug!(path = %root.display(), "Watching directory");
        }
        self.watcher = Some(watcher);

        let debouncer = Arc::new(EventDebouncer::new(Duration::from_millis(self.debounce_ms)));

        let record_scope = Arc::clone(&scope);
        let record_debouncer = Arc::clone(&debouncer);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                Self::record_event(&event, &record_scope, &record_debouncer);
            }
        });

        let compiler = Arc::clone(&self.compiler);
        let broadcaster = self.broadcaster.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(POLL_INTERVAL);
            loop {
                interval.tick().await;
                let ready = debouncer.drain_ready();
                if !ready.is_empty() {
                    Self::handle_batch(&ready, &scope, &compiler, &broadcaster).await;
                }
            }
        });

        Ok(())
    }

    /// Record a raw filesystem event into the debouncer.
    fn record_event(event: &Event, scope: &WatchScope, debouncer: &EventDebouncer) {
        let kind = match event.kind {
            EventKind::Create(_) => FsEventKind::Created,
            EventKind::Modify(_) => FsEventKind::Modified,
            EventKind::Remove(_) => FsEventKind::Removed,
            _ => return,
        };

        for path in &event.paths {
            if scope.classify(path).is_none() {
                continue;
            }
            debouncer.record(path.clone(), kind);
            tracing::debug!(path = %path.display(), ?kind, "Recorded filesystem event");
        }
    }

    /// Handle one batch of debounced events.
    ///
    /// Any number of icon changes in a batch cost one recompile.
    async fn handle_batch(
        events: &[FsEvent],
        scope: &WatchScope,
        compiler: &Arc<SpriteCompiler>,
        broadcaster: &broadcast::Sender<ReloadEvent>,
    ) {
        let start = Instant::now();
        let mut icons_changed = false;
        let mut pages = Vec::new();

        for event in events {
            match scope.classify(&event.path) {
                Some(Change::Icon) => icons_changed = true,
                Some(Change::Page(path)) => pages.push(path),
                None => {}
            }
        }

        if icons_changed && let Some(report) = sprite::recompile(Arc::clone(compiler)).await {
            let timestamp = chrono::Utc::now().timestamp_millis();
            let _ = broadcaster.send(ReloadEvent::Sprite { timestamp });
            tracing::info!(
                symbols = report.symbols.len(),
                elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Sprite reloaded"
            );
        }

        for path in pages {
            tracing::info!(path = %path, "Live reload event processed");
            let _ = broadcaster.send(ReloadEvent::Reload { path });
        }
    }

    /// Get a receiver for reload events.
    #[must_use]
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.broadcaster.subscribe()
    }
}

/// Create `dir` if it does not exist yet.
fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir)?;
    tracing::info!(path = %dir.display(), "Created icons directory");
    Ok(())
}

/// Resolve symlinks so paths compare equal to what the watcher reports.
fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn is_icon(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

/// URL path of a file relative to the source directory.
fn url_path(relative: &Path) -> String {
    let segments: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();
    format!("/{}", segments.join("/"))
}
