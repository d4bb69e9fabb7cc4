//! Codescope Extract — line-oriented symbol extraction
//!
//! Extraction is pattern matching over declaration shapes, not full
//! parsing: a deliberate precision/cost trade-off. False negatives on
//! unusual syntax are acceptable; crashes on malformed source are not.

pub mod languages;

use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use codescope_core::cache::TtlCache;
use codescope_core::config::CacheSettings;
use codescope_core::model::{Language, Symbol};

/// Fingerprint of file content, used to skip redundant re-extraction.
pub fn content_hash(content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

/// Extract symbols from source text.
///
/// A pure function of `(path, content, language)`: identical input always
/// yields an identical symbol list in declaration order, because downstream
/// consumers diff indexes by content hash. Unsupported languages yield an
/// empty list, not an error.
pub fn extract(path: &Path, content: &str, language: Language) -> Vec<Symbol> {
    languages::extract(path, content, language)
}

/// Extractor with memoization by content hash through a named symbol cache.
pub struct Extractor {
    cache: TtlCache<u64, Arc<Vec<Symbol>>>,
    extractions: AtomicU64,
}

impl Extractor {
    pub fn new(settings: &CacheSettings) -> Self {
        Self {
            cache: TtlCache::from_settings(settings),
            extractions: AtomicU64::new(0),
        }
    }

    /// Extract, serving repeated identical inputs from the symbol cache.
    ///
    /// Returns the content hash alongside the symbols so callers can store
    /// it for staleness checks without re-hashing.
    pub fn extract_cached(
        &self,
        path: &Path,
        content: &str,
        language: Language,
    ) -> (u64, Arc<Vec<Symbol>>) {
        let hash = content_hash(content);
        let key = memo_key(path, language, hash);
        if let Some(symbols) = self.cache.get(&key) {
            tracing::debug!("symbol cache hit for {}", path.display());
            return (hash, symbols);
        }

        let symbols = Arc::new(languages::extract(path, content, language));
        self.extractions.fetch_add(1, Ordering::Relaxed);
        let charge: u64 = symbols
            .iter()
            .map(|s| (std::mem::size_of::<Symbol>() + s.name.len() + s.signature.len()) as u64)
            .sum();
        self.cache.put_sized(key, Arc::clone(&symbols), charge);
        (hash, symbols)
    }

    /// How many real extractions have run (cache hits excluded).
    pub fn extraction_count(&self) -> u64 {
        self.extractions.load(Ordering::Relaxed)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> codescope_core::cache::CacheStats {
        self.cache.stats()
    }
}

/// The memo key covers path and language as well as content, so identical
/// content in two files never shares symbol records with the wrong
/// location.
fn memo_key(path: &Path, language: Language, content_hash: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    language.hash(&mut hasher);
    content_hash.hash(&mut hasher);
    hasher.finish()
}
