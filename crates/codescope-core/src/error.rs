//! Error types for Codescope

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while indexing or querying.
///
/// Per-file failures (`Unreadable`, `TooLarge`, `Excluded`) are recovered
/// locally during a directory walk and recorded in run statistics; they
/// never abort the run.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Permission or IO failure. The file is skipped, the walk continues.
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exceeds the configured byte limit. Skipped, not fatal.
    #[error("{path} is {size} bytes, over the {limit} byte limit")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    /// Matched an exclusion pattern or binary sniff. A normal skip.
    #[error("{path} is excluded from indexing")]
    Excluded { path: PathBuf },

    /// Malformed request parameters. Returned to the caller before any
    /// work is performed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Watcher setup or teardown failure.
    #[error("watch error: {0}")]
    Watch(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl IndexError {
    /// True for the Skip class of errors: the file is passed over and the
    /// surrounding operation continues.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            IndexError::Unreadable { .. } | IndexError::TooLarge { .. } | IndexError::Excluded { .. }
        )
    }
}

/// Result type alias for Codescope operations.
pub type Result<T> = std::result::Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_classification() {
        let err = IndexError::TooLarge {
            path: PathBuf::from("big.bin"),
            size: 10,
            limit: 5,
        };
        assert!(err.is_skip());
        assert!(IndexError::Excluded { path: PathBuf::from("x") }.is_skip());
        assert!(!IndexError::InvalidQuery("empty".into()).is_skip());
        assert!(!IndexError::Watch("gone".into()).is_skip());
    }

    #[test]
    fn display_includes_path_and_limit() {
        let err = IndexError::TooLarge {
            path: PathBuf::from("big.bin"),
            size: 2048,
            limit: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("big.bin"));
        assert!(msg.contains("1024"));
    }
}
