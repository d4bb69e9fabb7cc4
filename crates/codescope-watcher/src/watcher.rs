//! Filesystem event source
//!
//! Wraps a notify watcher and forwards raw events onto a channel.
//! Eligibility filtering happens here at the watcher boundary: paths
//! outside the extension allow-list or matching an exclusion pattern
//! generate no notifications at all.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use codescope_core::config::IndexingConfig;
use codescope_core::error::{IndexError, Result};
use codescope_core::model::ChangeKind;
use globset::GlobSet;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// One raw filesystem event, pre-filtered for eligibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// Decides which paths may generate notifications.
pub struct EventFilter {
    allowed_extensions: HashSet<String>,
    exclusions: GlobSet,
}

impl EventFilter {
    pub fn from_config(config: &IndexingConfig) -> Result<Self> {
        let mut builder = globset::GlobSetBuilder::new();
        for pattern in &config.ignore_patterns {
            let glob = globset::Glob::new(pattern).map_err(|e| {
                IndexError::Config(format!("invalid glob pattern '{}': {}", pattern, e))
            })?;
            builder.add(glob);
        }
        let exclusions = builder
            .build()
            .map_err(|e| IndexError::Config(format!("cannot build exclusion set: {}", e)))?;
        Ok(Self {
            allowed_extensions: config
                .include_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            exclusions,
        })
    }

    /// Extension and exclusion checks are purely textual so deleted paths,
    /// which can no longer be stat'ed, still filter correctly.
    pub fn is_eligible(&self, path: &Path) -> bool {
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.to_lowercase(),
            None => return false,
        };
        self.allowed_extensions.contains(&ext) && !self.exclusions.is_match(path)
    }
}

/// Watches directory trees and emits eligible [`RawEvent`]s.
pub struct FileWatcher {
    // Kept alive for the lifetime of the watch; dropping it stops
    // notifications.
    _watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<RawEvent>,
}

impl FileWatcher {
    pub fn new(roots: &[PathBuf], filter: EventFilter) -> Result<Self> {
        let (event_tx, events) = mpsc::unbounded_channel();

        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    let kind = match event.kind {
                        notify::EventKind::Create(_) => ChangeKind::Created,
                        notify::EventKind::Modify(_) => ChangeKind::Modified,
                        notify::EventKind::Remove(_) => ChangeKind::Deleted,
                        _ => return,
                    };
                    for path in event.paths {
                        if !filter.is_eligible(&path) {
                            continue;
                        }
                        debug!("raw event {:?}: {}", kind, path.display());
                        let _ = event_tx.send(RawEvent { path, kind });
                    }
                }
                Err(e) => error!("filesystem watch error: {}", e),
            })
            .map_err(|e| IndexError::Watch(format!("cannot create watcher: {}", e)))?;

        for root in roots {
            watcher
                .watch(root, RecursiveMode::Recursive)
                .map_err(|e| IndexError::Watch(format!("cannot watch {}: {}", root.display(), e)))?;
            info!("watching {}", root.display());
        }

        Ok(Self {
            _watcher: watcher,
            events,
        })
    }

    /// Receive the next eligible raw event. `None` once the watcher is
    /// gone.
    pub async fn recv(&mut self) -> Option<RawEvent> {
        self.events.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn filter() -> EventFilter {
        EventFilter::from_config(&IndexingConfig::default()).unwrap()
    }

    #[test]
    fn filter_accepts_allowed_extension() {
        let filter = filter();
        assert!(filter.is_eligible(Path::new("/src/main.rs")));
        assert!(filter.is_eligible(Path::new("/src/app.py")));
    }

    #[test]
    fn filter_rejects_unknown_extension_and_no_extension() {
        let filter = filter();
        assert!(!filter.is_eligible(Path::new("/src/readme.md")));
        assert!(!filter.is_eligible(Path::new("/src/Makefile")));
    }

    #[test]
    fn filter_rejects_excluded_directories() {
        let filter = filter();
        assert!(!filter.is_eligible(Path::new("/app/node_modules/x/index.js")));
        assert!(!filter.is_eligible(Path::new("/app/target/debug/build.rs")));
    }

    #[tokio::test]
    async fn watcher_emits_events_for_eligible_files() {
        let dir = TempDir::new().unwrap();
        let mut watcher = FileWatcher::new(&[dir.path().to_path_buf()], filter()).unwrap();

        // Ineligible file first: must produce nothing.
        fs::write(dir.path().join("notes.md"), "hi").unwrap();
        fs::write(dir.path().join("mod.rs"), "fn a() {}").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), watcher.recv())
            .await
            .expect("watcher should deliver an event")
            .expect("channel open");
        assert!(event.path.ends_with("mod.rs"));
    }

    #[tokio::test]
    async fn watching_missing_root_fails() {
        let result = FileWatcher::new(&[PathBuf::from("/definitely/not/here")], filter());
        assert!(matches!(result, Err(IndexError::Watch(_))));
    }
}
