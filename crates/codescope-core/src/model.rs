//! Core data structures for the symbol index

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discriminates what kind of declaration a symbol represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Class,
    Variable,
    Import,
}

/// A single declaration site extracted from source text.
///
/// Identity is `(file_path, line, name)`; the same name may appear at
/// multiple sites (overloads, redefinitions, shadowing) and every site is
/// retained as its own entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub file_path: PathBuf,
    /// 1-based declaration line.
    pub line: u32,
    /// Last line of the declaration's block. Equals `line` for
    /// variables and imports.
    pub line_end: u32,
    /// The declaration line's text, trimmed, for display.
    pub signature: String,
    /// Nearest contiguous comment block attached to the declaration.
    pub doc_comment: Option<String>,
}

/// How a reference site uses the symbol name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Call,
    ImportUse,
    Assignment,
    Mention,
}

/// One usage site of a symbol name.
///
/// References are matched purely by name; they are never resolved to a
/// specific declaration across files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub symbol_name: String,
    pub file_path: PathBuf,
    /// 1-based line of the occurrence.
    pub line: u32,
    /// The occurrence line plus the configured number of surrounding lines.
    pub context: String,
    pub kind: ReferenceKind,
}

/// Per-file cached extraction result.
///
/// Owned exclusively by the symbol index: created on first index, swapped
/// wholesale on re-index, removed when the file is deleted or the index is
/// cleared. The stored `content_hash` reflects the file bytes at last index
/// time; a mismatch against the on-disk hash marks the entry stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub content_hash: u64,
    pub last_indexed_at: DateTime<Utc>,
    /// Symbols in declaration order.
    pub symbols: Vec<Symbol>,
    pub size_bytes: u64,
}

impl FileEntry {
    /// Rough in-memory footprint, used for index statistics.
    pub fn memory_estimate(&self) -> usize {
        let mut bytes = std::mem::size_of::<Self>();
        bytes += self.path.as_os_str().len();
        for sym in &self.symbols {
            bytes += std::mem::size_of::<Symbol>();
            bytes += sym.name.len() + sym.signature.len();
            bytes += sym.file_path.as_os_str().len();
            bytes += sym.doc_comment.as_ref().map_or(0, |d| d.len());
        }
        bytes
    }
}

/// Kind of observed filesystem mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

/// One observed filesystem mutation. Read-only once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub path: PathBuf,
    pub kind: ChangeKind,
    pub timestamp: DateTime<Utc>,
}

/// Result of one directory indexing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub files_indexed: usize,
    pub symbols_found: usize,
    /// Files passed over for a normal reason (excluded pattern, oversized,
    /// binary content).
    pub files_skipped: usize,
    /// Files that could not be read. Never fatal to the run.
    pub files_failed: usize,
    pub elapsed_ms: u64,
    /// Set when a caller-supplied deadline stopped the walk early.
    pub truncated: bool,
}

/// Point-in-time view of the whole index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub files_indexed: usize,
    pub symbols_found: usize,
    /// Cumulative count of references returned by reference scans.
    pub references_found: u64,
    pub memory_estimate_bytes: usize,
    pub last_indexed_at: Option<DateTime<Utc>>,
}

/// Supported languages for symbol extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Python,
    Rust,
    JavaScript,
    TypeScript,
    Go,
    /// Fall-through for extensions with no extraction strategy. Extraction
    /// yields an empty symbol list, not an error.
    Unsupported,
}

impl Language {
    /// Detect language from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("py") | Some("pyi") => Language::Python,
            Some("rs") => Language::Rust,
            Some("js") | Some("jsx") | Some("mjs") | Some("cjs") => Language::JavaScript,
            Some("ts") | Some("tsx") => Language::TypeScript,
            Some("go") => Language::Go,
            _ => Language::Unsupported,
        }
    }
}
