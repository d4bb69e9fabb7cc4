//! The symbol index

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::Utc;
use codescope_core::cache::{CacheStats, TtlCache};
use codescope_core::config::Config;
use codescope_core::error::{IndexError, Result};
use codescope_core::model::{
    FileEntry, IndexSnapshot, IndexStats, Language, Reference, SymbolKind,
};
use codescope_extract::{Extractor, content_hash};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::references::scan_content;
use crate::search::{SymbolMatch, rank_symbols};
use crate::walker::{eligible_files, looks_binary};

/// Result of a reference scan.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceScan {
    pub references: Vec<Reference>,
    /// Set when a deadline stopped the scan before every file was visited.
    pub truncated: bool,
}

/// In-memory symbol index over a set of files.
///
/// The `FileEntry` map is the only state mutated by more than one actor;
/// every mutation goes through the per-file update path here. An update is
/// applied atomically: extraction completes fully off to the side, then the
/// old entry is swapped for the new one, so readers never observe a
/// half-written entry and re-indexing one file never blocks a read for
/// another.
pub struct SymbolIndex {
    files: DashMap<PathBuf, Arc<FileEntry>>,
    extractor: Extractor,
    content_cache: TtlCache<PathBuf, Arc<String>>,
    config: Arc<Config>,
    references_found: AtomicU64,
}

impl SymbolIndex {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            files: DashMap::new(),
            extractor: Extractor::new(&config.cache.symbols),
            content_cache: TtlCache::from_settings(&config.cache.file_content),
            config,
            references_found: AtomicU64::new(0),
        }
    }

    /// Index one file, skipping extraction when the on-disk hash matches
    /// the stored entry. Returns the number of symbols for the file.
    pub fn index_file(&self, path: &Path) -> Result<usize> {
        let limit = self.config.indexing.max_file_size_bytes;
        let metadata = fs::metadata(path).map_err(|source| IndexError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        if metadata.len() > limit {
            return Err(IndexError::TooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                limit,
            });
        }

        let bytes = fs::read(path).map_err(|source| IndexError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        if looks_binary(&bytes) {
            return Err(IndexError::Excluded {
                path: path.to_path_buf(),
            });
        }
        let content = String::from_utf8_lossy(&bytes).into_owned();

        let hash = content_hash(&content);
        if let Some(entry) = self.files.get(path) {
            if entry.content_hash == hash {
                debug!("unchanged, serving cached entry: {}", path.display());
                return Ok(entry.symbols.len());
            }
        }

        let language = Language::from_path(path);
        let (hash, symbols) = self.extractor.extract_cached(path, &content, language);
        let entry = FileEntry {
            path: path.to_path_buf(),
            content_hash: hash,
            last_indexed_at: Utc::now(),
            symbols: symbols.as_ref().clone(),
            size_bytes: metadata.len(),
        };
        let count = entry.symbols.len();

        self.content_cache
            .put_sized(path.to_path_buf(), Arc::new(content), metadata.len());
        self.files.insert(path.to_path_buf(), Arc::new(entry));
        debug!("indexed {} ({} symbols)", path.display(), count);
        Ok(count)
    }

    /// Drop one file's entry, e.g. after a delete event.
    pub fn remove_file(&self, path: &Path) -> bool {
        self.content_cache.invalidate(&path.to_path_buf());
        self.files.remove(path).is_some()
    }

    /// Walk a directory tree and index every eligible file. Per-file
    /// failures are counted, never fatal; a deadline stops the run early
    /// with `truncated` set.
    pub fn index_directory(
        &self,
        root: &Path,
        recursive: bool,
        deadline: Option<Instant>,
    ) -> Result<IndexStats> {
        let started = Instant::now();
        let outcome = eligible_files(root, recursive, &self.config.indexing)?;

        let mut stats = IndexStats {
            files_skipped: outcome.skipped,
            files_failed: outcome.failed,
            ..IndexStats::default()
        };

        for path in &outcome.eligible {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                stats.truncated = true;
                break;
            }
            match self.index_file(path) {
                Ok(count) => {
                    stats.files_indexed += 1;
                    stats.symbols_found += count;
                }
                Err(err) if err.is_skip() => {
                    match err {
                        IndexError::Unreadable { .. } => stats.files_failed += 1,
                        _ => stats.files_skipped += 1,
                    }
                    warn!("skipping {}: {}", path.display(), err);
                }
                Err(err) => return Err(err),
            }
        }

        stats.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            "indexed {} files, {} symbols in {}ms ({} skipped, {} failed)",
            stats.files_indexed,
            stats.symbols_found,
            stats.elapsed_ms,
            stats.files_skipped,
            stats.files_failed
        );
        Ok(stats)
    }

    /// Search indexed symbols by name.
    pub fn search_symbols(
        &self,
        query: &str,
        kind_filter: Option<SymbolKind>,
        fuzzy: bool,
    ) -> Result<Vec<SymbolMatch>> {
        if query.trim().is_empty() {
            return Err(IndexError::InvalidQuery("empty symbol query".into()));
        }
        let entries = self.entries_snapshot();
        Ok(rank_symbols(&entries, query, kind_filter, fuzzy))
    }

    /// Scan all indexed files for whole-token occurrences of a symbol
    /// name. Brute-force by design: classification depends on lexical
    /// context that is cheap to recompute per query, so the scan is bounded
    /// by the deadline instead of maintained incrementally.
    pub fn find_references(
        &self,
        symbol_name: &str,
        context_lines: usize,
        deadline: Option<Instant>,
    ) -> Result<ReferenceScan> {
        if symbol_name.trim().is_empty() {
            return Err(IndexError::InvalidQuery("empty symbol name".into()));
        }

        let mut entries = self.entries_snapshot();
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        let mut references = Vec::new();
        let mut truncated = false;
        for entry in entries {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                truncated = true;
                break;
            }
            let Some(content) = self.read_content(&entry.path) else {
                continue;
            };
            let decl_lines: HashSet<u32> = entry
                .symbols
                .iter()
                .filter(|s| s.name == symbol_name)
                .map(|s| s.line)
                .collect();
            references.extend(scan_content(
                symbol_name,
                &entry.path,
                &content,
                context_lines,
                &decl_lines,
            ));
        }

        self.references_found
            .fetch_add(references.len() as u64, Ordering::Relaxed);
        Ok(ReferenceScan {
            references,
            truncated,
        })
    }

    /// Drop every file entry and reset counters. Does not touch the change
    /// tracker's history.
    pub fn clear(&self) {
        self.files.clear();
        self.content_cache.clear();
        self.extractor.clear_cache();
        self.references_found.store(0, Ordering::Relaxed);
        info!("index cleared");
    }

    /// Clear the content and symbol caches without dropping the index.
    /// Readers mid-flight may observe either state.
    pub fn clear_caches(&self) {
        self.content_cache.clear();
        self.extractor.clear_cache();
    }

    /// Point-in-time statistics over the whole index.
    pub fn snapshot(&self) -> IndexSnapshot {
        let mut snapshot = IndexSnapshot {
            references_found: self.references_found.load(Ordering::Relaxed),
            ..IndexSnapshot::default()
        };
        for entry in self.files.iter() {
            let entry = entry.value();
            snapshot.files_indexed += 1;
            snapshot.symbols_found += entry.symbols.len();
            snapshot.memory_estimate_bytes += entry.memory_estimate();
            if snapshot.last_indexed_at.is_none_or(|at| at < entry.last_indexed_at) {
                snapshot.last_indexed_at = Some(entry.last_indexed_at);
            }
        }
        snapshot
    }

    /// Stats for the named caches this index owns.
    pub fn cache_stats(&self) -> (CacheStats, CacheStats) {
        (self.content_cache.stats(), self.extractor.cache_stats())
    }

    /// How many real extractions have run; cache hits and unchanged-hash
    /// no-ops are excluded.
    pub fn extraction_count(&self) -> u64 {
        self.extractor.extraction_count()
    }

    /// Clone out the current entries. Readers work off this snapshot and
    /// never block an in-progress single-file re-index.
    fn entries_snapshot(&self) -> Vec<Arc<FileEntry>> {
        self.files.iter().map(|r| Arc::clone(r.value())).collect()
    }

    fn read_content(&self, path: &Path) -> Option<Arc<String>> {
        let key = path.to_path_buf();
        if let Some(content) = self.content_cache.get(&key) {
            return Some(content);
        }
        match fs::read_to_string(path) {
            Ok(content) => {
                let content = Arc::new(content);
                self.content_cache
                    .put_sized(key, Arc::clone(&content), content.len() as u64);
                Some(content)
            }
            Err(e) => {
                warn!("cannot read {} for reference scan: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::MatchQuality;
    use codescope_core::model::ReferenceKind;
    use std::fs;
    use tempfile::TempDir;

    fn index() -> SymbolIndex {
        SymbolIndex::new(Arc::new(Config::default()))
    }

    #[test]
    fn index_then_search_finds_definition() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def foo(x): return x\n").unwrap();
        fs::write(dir.path().join("b.py"), "foo(1)\n").unwrap();

        let idx = index();
        let stats = idx.index_directory(dir.path(), true, None).unwrap();
        assert_eq!(stats.files_indexed, 2);
        assert_eq!(stats.symbols_found, 1);
        assert!(!stats.truncated);

        let hits = idx.search_symbols("foo", None, false).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].symbol.line, 1);
        assert!(hits[0].symbol.file_path.ends_with("a.py"));
    }

    #[test]
    fn references_exclude_declaration_and_classify_calls() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def foo(x): return x\n").unwrap();
        fs::write(dir.path().join("b.py"), "foo(1)\n").unwrap();

        let idx = index();
        idx.index_directory(dir.path(), true, None).unwrap();

        let scan = idx.find_references("foo", 2, None).unwrap();
        assert_eq!(scan.references.len(), 1);
        assert!(scan.references[0].file_path.ends_with("b.py"));
        assert_eq!(scan.references[0].line, 1);
        assert_eq!(scan.references[0].kind, ReferenceKind::Call);
        assert!(!scan.truncated);
    }

    #[test]
    fn second_index_of_unchanged_file_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.py");
        fs::write(&file, "def foo(x): return x\n").unwrap();

        let idx = index();
        assert_eq!(idx.index_file(&file).unwrap(), 1);
        assert_eq!(idx.index_file(&file).unwrap(), 1);
        assert_eq!(idx.extraction_count(), 1);
    }

    #[test]
    fn modified_file_re_extracts_without_touching_others() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.py");
        let b = dir.path().join("b.py");
        fs::write(&a, "def foo(x): return x\n").unwrap();
        fs::write(&b, "def bar(): pass\n").unwrap();

        let idx = index();
        idx.index_directory(dir.path(), true, None).unwrap();
        assert_eq!(idx.extraction_count(), 2);

        fs::write(&a, "def foo(x, y): return x + y\n").unwrap();
        idx.index_file(&a).unwrap();
        // Only a.py re-extracted.
        assert_eq!(idx.extraction_count(), 3);

        let hits = idx.search_symbols("foo", None, false).unwrap();
        assert_eq!(hits[0].symbol.signature, "def foo(x, y): return x + y");
    }

    #[test]
    fn fuzzy_falls_back_when_no_exact_match() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def grep_all(): pass\n").unwrap();

        let idx = index();
        idx.index_directory(dir.path(), true, None).unwrap();

        assert!(idx.search_symbols("gpl", None, false).unwrap().is_empty());
        let hits = idx.search_symbols("gpl", None, true).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].quality, MatchQuality::Fuzzy);
    }

    #[test]
    fn empty_query_fails_before_any_work() {
        let idx = index();
        assert!(matches!(
            idx.search_symbols("  ", None, false),
            Err(IndexError::InvalidQuery(_))
        ));
        assert!(matches!(
            idx.find_references("", 0, None),
            Err(IndexError::InvalidQuery(_))
        ));
    }

    #[test]
    fn unreadable_file_counts_as_failed_not_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ok.py"), "def fine(): pass\n").unwrap();
        let missing = dir.path().join("gone.py");
        let idx = index();
        assert!(matches!(
            idx.index_file(&missing),
            Err(IndexError::Unreadable { .. })
        ));
        let stats = idx.index_directory(dir.path(), true, None).unwrap();
        assert_eq!(stats.files_indexed, 1);
    }

    #[test]
    fn binary_content_is_excluded() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("blob.py");
        fs::write(&file, b"payload\x00more").unwrap();
        let idx = index();
        assert!(matches!(idx.index_file(&file), Err(IndexError::Excluded { .. })));
    }

    #[test]
    fn oversized_file_is_too_large() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("big.py");
        fs::write(&file, "x = 1\n".repeat(1024)).unwrap();

        let mut config = Config::default();
        config.indexing.max_file_size_bytes = 32;
        let idx = SymbolIndex::new(Arc::new(config));
        assert!(matches!(idx.index_file(&file), Err(IndexError::TooLarge { .. })));
    }

    #[test]
    fn remove_file_drops_entry() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.py");
        fs::write(&file, "def foo(): pass\n").unwrap();

        let idx = index();
        idx.index_file(&file).unwrap();
        assert!(idx.remove_file(&file));
        assert!(!idx.remove_file(&file));
        assert!(idx.search_symbols("foo", None, false).unwrap().is_empty());
    }

    #[test]
    fn clear_resets_everything() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def foo(): pass\n").unwrap();

        let idx = index();
        idx.index_directory(dir.path(), true, None).unwrap();
        idx.find_references("foo", 0, None).unwrap();
        idx.clear();

        let snapshot = idx.snapshot();
        assert_eq!(snapshot.files_indexed, 0);
        assert_eq!(snapshot.symbols_found, 0);
        assert_eq!(snapshot.references_found, 0);
        assert!(snapshot.last_indexed_at.is_none());
    }

    #[test]
    fn snapshot_reports_totals() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def foo(): pass\ndef bar(): pass\n").unwrap();

        let idx = index();
        idx.index_directory(dir.path(), true, None).unwrap();
        let snapshot = idx.snapshot();
        assert_eq!(snapshot.files_indexed, 1);
        assert_eq!(snapshot.symbols_found, 2);
        assert!(snapshot.memory_estimate_bytes > 0);
        assert!(snapshot.last_indexed_at.is_some());
    }

    #[test]
    fn expired_deadline_truncates_reference_scan() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def foo(): pass\n").unwrap();

        let idx = index();
        idx.index_directory(dir.path(), true, None).unwrap();

        let past = Instant::now() - std::time::Duration::from_millis(1);
        let scan = idx.find_references("foo", 0, Some(past)).unwrap();
        assert!(scan.truncated);
        assert!(scan.references.is_empty());
    }
}
