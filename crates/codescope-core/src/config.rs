//! Configuration for the indexing engine
//!
//! The engine treats configuration as an immutable snapshot per operation:
//! callers hand an `Arc<Config>` to each component at construction and
//! re-read it only at explicit reload points, never mid-operation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub indexing: IndexingConfig,
    pub watching: WatchingConfig,
    pub cache: CacheConfig,
    pub git: GitConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| IndexError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| IndexError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        tracing::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.indexing.max_file_size_bytes == 0 {
            return Err(IndexError::Config(
                "indexing.max_file_size_bytes must be positive".into(),
            ));
        }
        if self.indexing.include_extensions.is_empty() {
            return Err(IndexError::Config(
                "indexing.include_extensions must not be empty".into(),
            ));
        }
        if self.watching.debounce_ms == 0 {
            return Err(IndexError::Config("watching.debounce_ms must be positive".into()));
        }
        if self.watching.history_capacity == 0 {
            return Err(IndexError::Config(
                "watching.history_capacity must be positive".into(),
            ));
        }
        if self.watching.worker_count == 0 {
            return Err(IndexError::Config("watching.worker_count must be positive".into()));
        }
        for (name, settings) in [
            ("file_content", &self.cache.file_content),
            ("symbols", &self.cache.symbols),
            ("git", &self.cache.git),
        ] {
            if settings.capacity == 0 {
                return Err(IndexError::Config(format!(
                    "cache.{}.capacity must be positive",
                    name
                )));
            }
        }
        if self.git.timeout_ms == 0 {
            return Err(IndexError::Config("git.timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

/// Indexing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Files above this size are skipped.
    pub max_file_size_bytes: u64,
    /// Glob patterns excluded from indexing and watching.
    pub ignore_patterns: Vec<String>,
    /// File extensions eligible for indexing and watching.
    pub include_extensions: Vec<String>,
    /// Deadline for a directory walk or reference scan; past it the
    /// operation returns partial results flagged truncated.
    pub scan_timeout_ms: u64,
    /// Lines of surrounding text attached to each reference.
    pub context_lines: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 1024 * 1024,
            ignore_patterns: vec![
                "**/node_modules/**".to_string(),
                "**/target/**".to_string(),
                "**/dist/**".to_string(),
                "**/.git/**".to_string(),
                "**/__pycache__/**".to_string(),
                "**/.venv/**".to_string(),
                "**/venv/**".to_string(),
            ],
            include_extensions: vec![
                "py".to_string(),
                "pyi".to_string(),
                "rs".to_string(),
                "js".to_string(),
                "jsx".to_string(),
                "mjs".to_string(),
                "cjs".to_string(),
                "ts".to_string(),
                "tsx".to_string(),
                "go".to_string(),
            ],
            scan_timeout_ms: 30_000,
            context_lines: 2,
        }
    }
}

/// File watching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchingConfig {
    /// Quiet period before a burst of events for one path collapses into a
    /// single logical change.
    pub debounce_ms: u64,
    /// How often the debouncer is drained.
    pub poll_interval_ms: u64,
    /// Bounded history of recent changes; oldest evicted first.
    pub history_capacity: usize,
    /// Concurrent re-index workers.
    pub worker_count: usize,
}

impl Default for WatchingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            poll_interval_ms: 100,
            history_capacity: 512,
            worker_count: 4,
        }
    }
}

/// Capacity and TTL for one named cache instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub capacity: usize,
    /// Seconds until an entry expires; absent means no TTL.
    pub ttl_seconds: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: 1024,
            ttl_seconds: Some(300),
        }
    }
}

/// Per-instance cache configuration. Each named cache is sized and aged
/// independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub file_content: CacheSettings,
    pub symbols: CacheSettings,
    pub git: CacheSettings,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            file_content: CacheSettings {
                capacity: 512,
                ttl_seconds: Some(120),
            },
            symbols: CacheSettings {
                capacity: 2048,
                ttl_seconds: Some(600),
            },
            // Git history changes rarely relative to code edits, so this
            // cache ages slower than the file-content cache.
            git: CacheSettings {
                capacity: 256,
                ttl_seconds: Some(900),
            },
        }
    }
}

/// Git integration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Bound on any single git invocation.
    pub timeout_ms: u64,
    /// Default commit limit for history queries.
    pub max_commits: usize,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            max_commits: 100,
        }
    }
}
