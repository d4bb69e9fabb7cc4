//! Exclusion-aware directory walking

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use codescope_core::config::IndexingConfig;
use codescope_core::error::{IndexError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use tracing::warn;

/// Files surviving the exclusion filters, plus counts of what fell out.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// Paths eligible for indexing, in walk order.
    pub eligible: Vec<PathBuf>,
    /// Wrong extension, exclusion pattern, or oversized.
    pub skipped: usize,
    /// Entries the walker could not read.
    pub failed: usize,
}

/// Compile the configured exclusion patterns.
pub(crate) fn build_exclusions(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| IndexError::Config(format!("invalid glob pattern '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| IndexError::Config(format!("cannot build exclusion set: {}", e)))
}

/// Walk `root` honoring gitignore files, the configured exclusion patterns,
/// the extension allow-list, and the byte-size limit. Unreadable entries
/// are counted, never fatal.
pub fn eligible_files(root: &Path, recursive: bool, config: &IndexingConfig) -> Result<WalkOutcome> {
    if !root.is_dir() {
        return Err(IndexError::Unreadable {
            path: root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let exclusions = build_exclusions(&config.ignore_patterns)?;
    let allowed: HashSet<String> = config
        .include_extensions
        .iter()
        .map(|e| e.to_lowercase())
        .collect();

    let mut outcome = WalkOutcome::default();
    let walk = WalkBuilder::new(root)
        .follow_links(false)
        .max_depth(if recursive { None } else { Some(1) })
        .build();

    for entry in walk {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("walk error under {}: {}", root.display(), e);
                outcome.failed += 1;
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();

        if exclusions.is_match(path) {
            outcome.skipped += 1;
            continue;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if !allowed.contains(&ext) {
            outcome.skipped += 1;
            continue;
        }
        match entry.metadata() {
            Ok(meta) if meta.len() > config.max_file_size_bytes => {
                outcome.skipped += 1;
            }
            Ok(_) => outcome.eligible.push(path.to_path_buf()),
            Err(e) => {
                warn!("cannot stat {}: {}", path.display(), e);
                outcome.failed += 1;
            }
        }
    }

    Ok(outcome)
}

/// NUL-byte sniff over the leading bytes; matches how git distinguishes
/// binary from text.
pub(crate) fn looks_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(8192).any(|b| *b == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config() -> IndexingConfig {
        IndexingConfig::default()
    }

    #[test]
    fn walk_collects_allowed_extensions_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("b.rs"), "fn b() {}\n").unwrap();
        fs::write(dir.path().join("c.png"), [137u8, 80]).unwrap();

        let outcome = eligible_files(dir.path(), true, &config()).unwrap();
        assert_eq!(outcome.eligible.len(), 2);
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn exclusion_patterns_apply() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), "x\n").unwrap();
        fs::write(dir.path().join("app.js"), "x\n").unwrap();

        let outcome = eligible_files(dir.path(), true, &config()).unwrap();
        assert_eq!(outcome.eligible.len(), 1);
        assert!(outcome.eligible[0].ends_with("app.js"));
    }

    #[test]
    fn oversized_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("big.py"), "x".repeat(64)).unwrap();
        let mut cfg = config();
        cfg.max_file_size_bytes = 16;

        let outcome = eligible_files(dir.path(), true, &cfg).unwrap();
        assert!(outcome.eligible.is_empty());
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn non_recursive_walk_stays_at_top_level() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("top.py"), "x = 1\n").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/deep.py"), "y = 2\n").unwrap();

        let outcome = eligible_files(dir.path(), false, &config()).unwrap();
        assert_eq!(outcome.eligible.len(), 1);
        assert!(outcome.eligible[0].ends_with("top.py"));
    }

    #[test]
    fn missing_root_is_unreadable() {
        let err = eligible_files(Path::new("/definitely/not/here"), true, &config()).unwrap_err();
        assert!(matches!(err, IndexError::Unreadable { .. }));
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let mut cfg = config();
        cfg.ignore_patterns.push("[".to_string());
        let dir = TempDir::new().unwrap();
        let err = eligible_files(dir.path(), true, &cfg).unwrap_err();
        assert!(matches!(err, IndexError::Config(_)));
    }

    #[test]
    fn binary_sniff() {
        assert!(looks_binary(b"ELF\x00\x01\x02"));
        assert!(!looks_binary(b"plain text, nothing odd"));
    }
}
