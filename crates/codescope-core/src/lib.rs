//! Codescope Core — data model, configuration, error taxonomy, and cache layer

pub mod cache;
pub mod config;
pub mod error;
pub mod model;

pub use cache::{CacheStats, TtlCache};
pub use config::{
    CacheConfig, CacheSettings, Config, GitConfig, IndexingConfig, WatchingConfig,
};
pub use error::{IndexError, Result};
pub use model::{
    ChangeKind, ChangeRecord, FileEntry, IndexSnapshot, IndexStats, Language, Reference,
    ReferenceKind, Symbol, SymbolKind,
};
