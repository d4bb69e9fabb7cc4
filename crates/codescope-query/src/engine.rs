//! The query engine façade

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use codescope_core::cache::CacheStats;
use codescope_core::config::Config;
use codescope_core::error::Result;
use codescope_core::model::{ChangeRecord, IndexSnapshot, IndexStats, Reference, SymbolKind};
use codescope_index::{SymbolIndex, SymbolMatch};
use codescope_watcher::ChangeTracker;
use serde::Serialize;
use tracing::info;

use crate::git::{BlameLine, CommitRecord, FileDiff, GitClient, GitOutcome};

/// Symbol search results plus query metadata.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub symbols: Vec<SymbolMatch>,
    pub total_found: usize,
    pub search_time_ms: u64,
}

/// Reference scan results plus query metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ReferencesResponse {
    pub references: Vec<Reference>,
    pub total_found: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MonitoringResponse {
    pub monitoring_active: bool,
}

/// Stats for every named cache the engine owns.
#[derive(Debug, Clone, Serialize)]
pub struct CacheOverview {
    pub file_content: CacheStats,
    pub symbols: CacheStats,
    pub git: CacheStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticsResponse {
    #[serde(flatten)]
    pub index: IndexSnapshot,
    pub caches: CacheOverview,
}

/// Façade combining symbol-index reads, change tracking, and cached git
/// queries behind the caller-facing surface.
pub struct QueryEngine {
    index: Arc<SymbolIndex>,
    tracker: ChangeTracker,
    git: GitClient,
    config: Arc<Config>,
}

impl QueryEngine {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let index = Arc::new(SymbolIndex::new(Arc::clone(&config)));
        let tracker = ChangeTracker::new(Arc::clone(&index), Arc::clone(&config));
        let git = GitClient::new(&config.cache.git, &config.git);
        Self {
            index,
            tracker,
            git,
            config,
        }
    }

    /// The underlying index, for callers composing their own queries.
    pub fn index(&self) -> &Arc<SymbolIndex> {
        &self.index
    }

    /// Index a directory tree, bounded by the configured scan deadline.
    pub fn index_directory(&self, root: &Path, recursive: bool) -> Result<IndexStats> {
        self.index.index_directory(root, recursive, Some(self.scan_deadline()))
    }

    /// Search indexed symbols, timing the query for the response envelope.
    pub fn search_symbols(
        &self,
        query: &str,
        kind_filter: Option<SymbolKind>,
        fuzzy: bool,
    ) -> Result<SearchResponse> {
        let started = Instant::now();
        let symbols = self.index.search_symbols(query, kind_filter, fuzzy)?;
        Ok(SearchResponse {
            total_found: symbols.len(),
            symbols,
            search_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Find whole-token references to a symbol name across indexed files.
    pub fn find_references(
        &self,
        symbol_name: &str,
        context_lines: Option<usize>,
    ) -> Result<ReferencesResponse> {
        let context = context_lines.unwrap_or(self.config.indexing.context_lines);
        let scan = self
            .index
            .find_references(symbol_name, context, Some(self.scan_deadline()))?;
        Ok(ReferencesResponse {
            total_found: scan.references.len(),
            references: scan.references,
            truncated: scan.truncated,
        })
    }

    pub fn statistics(&self) -> StatisticsResponse {
        let (file_content, symbols) = self.index.cache_stats();
        StatisticsResponse {
            index: self.index.snapshot(),
            caches: CacheOverview {
                file_content,
                symbols,
                git: self.git.cache_stats(),
            },
        }
    }

    /// Start watching the given roots; idempotent while active.
    pub fn start_monitoring(&self, roots: &[PathBuf]) -> Result<MonitoringResponse> {
        self.tracker.start(roots)?;
        Ok(MonitoringResponse {
            monitoring_active: self.tracker.is_watching(),
        })
    }

    pub fn stop_monitoring(&self) -> MonitoringResponse {
        self.tracker.stop();
        MonitoringResponse {
            monitoring_active: self.tracker.is_watching(),
        }
    }

    pub fn monitoring_active(&self) -> bool {
        self.tracker.is_watching()
    }

    /// Changes observed within the last `hours`, oldest first.
    pub fn recent_changes(&self, hours: u64) -> Vec<ChangeRecord> {
        self.tracker.recent_changes(chrono::Duration::hours(hours as i64))
    }

    /// Drop the whole index. Change history is left intact.
    pub fn clear_index(&self) {
        self.index.clear();
    }

    /// Clear every named cache. Readers mid-flight may observe either
    /// state; readers arriving after the call see empty caches.
    pub fn clear_caches(&self) {
        self.index.clear_caches();
        self.git.clear_cache();
        info!("all caches cleared");
    }

    // ── Git-backed queries ──────────────────────────────────

    pub async fn file_history(
        &self,
        repo: &Path,
        path: &str,
        limit: Option<usize>,
    ) -> GitOutcome<CommitRecord> {
        self.git.file_history(repo, path, limit).await
    }

    pub async fn blame(&self, repo: &Path, path: &str) -> GitOutcome<BlameLine> {
        self.git.blame(repo, path).await
    }

    pub async fn diff_stats(&self, repo: &Path, rev: Option<&str>) -> GitOutcome<FileDiff> {
        self.git.diff_stats(repo, rev).await
    }

    fn scan_deadline(&self) -> Instant {
        Instant::now() + Duration::from_millis(self.config.indexing.scan_timeout_ms)
    }
}
