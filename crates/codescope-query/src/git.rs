//! Cached git subprocess queries
//!
//! Every query follows the same path: check the git-result cache by the
//! joined command line, on a miss invoke the git binary with a bounded
//! timeout, parse the line-oriented stdout, and cache the raw output under
//! the longer git TTL. A non-zero exit or timeout yields an empty result
//! set plus an error description, never a panic, so callers can render
//! "no matches" and "query failed" distinctly.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use codescope_core::cache::{CacheStats, TtlCache};
use codescope_core::config::GitConfig;
use serde::Serialize;
use tokio::process::Command;
use tracing::debug;

/// Field separator used in `--pretty=format:` so subjects may contain
/// anything printable.
const FIELD_SEP: char = '\u{1f}';

/// One commit touching a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitRecord {
    pub hash: String,
    pub author: String,
    pub date: String,
    pub subject: String,
}

/// One blamed source line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlameLine {
    pub line: u32,
    pub commit: String,
    pub author: String,
    pub content: String,
}

/// Added/removed line counts for one file in a diff.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDiff {
    pub path: String,
    pub added: u64,
    pub removed: u64,
}

/// Result of a git-backed query. An error leaves `records` empty; an empty
/// `records` with no error means the query genuinely matched nothing.
#[derive(Debug, Clone, Serialize)]
pub struct GitOutcome<T> {
    pub records: Vec<T>,
    pub error: Option<String>,
}

impl<T> GitOutcome<T> {
    fn ok(records: Vec<T>) -> Self {
        Self {
            records,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            records: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Invokes the git binary and caches raw stdout by command line.
pub struct GitClient {
    cache: TtlCache<String, Arc<String>>,
    timeout: Duration,
    max_commits: usize,
}

impl GitClient {
    pub fn new(cache_settings: &codescope_core::config::CacheSettings, git: &GitConfig) -> Self {
        Self {
            cache: TtlCache::from_settings(cache_settings),
            timeout: Duration::from_millis(git.timeout_ms),
            max_commits: git.max_commits,
        }
    }

    /// Commits touching a file, newest first.
    pub async fn file_history(
        &self,
        repo: &Path,
        path: &str,
        limit: Option<usize>,
    ) -> GitOutcome<CommitRecord> {
        let limit = limit.unwrap_or(self.max_commits).to_string();
        let format = format!("--pretty=format:%H{0}%an{0}%aI{0}%s", FIELD_SEP);
        let args = vec![
            "log".to_string(),
            format,
            "--date=iso-strict".to_string(),
            "-n".to_string(),
            limit,
            "--".to_string(),
            path.to_string(),
        ];
        match self.run(repo, &args).await {
            Ok(stdout) => GitOutcome::ok(parse_log(&stdout)),
            Err(e) => GitOutcome::failed(e),
        }
    }

    /// Per-line authorship for a file at HEAD.
    pub async fn blame(&self, repo: &Path, path: &str) -> GitOutcome<BlameLine> {
        let args = vec![
            "blame".to_string(),
            "--line-porcelain".to_string(),
            "--".to_string(),
            path.to_string(),
        ];
        match self.run(repo, &args).await {
            Ok(stdout) => GitOutcome::ok(parse_blame(&stdout)),
            Err(e) => GitOutcome::failed(e),
        }
    }

    /// Per-file added/removed counts for the working tree against a
    /// revision (HEAD when absent).
    pub async fn diff_stats(&self, repo: &Path, rev: Option<&str>) -> GitOutcome<FileDiff> {
        let mut args = vec!["diff".to_string(), "--numstat".to_string()];
        if let Some(rev) = rev {
            args.push(rev.to_string());
        }
        match self.run(repo, &args).await {
            Ok(stdout) => GitOutcome::ok(parse_numstat(&stdout)),
            Err(e) => GitOutcome::failed(e),
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    async fn run(&self, repo: &Path, args: &[String]) -> std::result::Result<Arc<String>, String> {
        let key = format!("{}\u{1f}{}", repo.display(), args.join("\u{1f}"));
        if let Some(stdout) = self.cache.get(&key) {
            debug!("git cache hit: {}", args.join(" "));
            return Ok(stdout);
        }

        let mut command = Command::new("git");
        command
            .arg("-C")
            .arg(repo)
            .args(args)
            .kill_on_drop(true);
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                format!(
                    "git {} timed out after {}ms",
                    args.first().map(String::as_str).unwrap_or(""),
                    self.timeout.as_millis()
                )
            })?
            .map_err(|e| format!("cannot launch git: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "git {} exited with {}: {}",
                args.first().map(String::as_str).unwrap_or(""),
                output.status,
                stderr.trim()
            ));
        }

        let stdout = Arc::new(String::from_utf8_lossy(&output.stdout).into_owned());
        self.cache
            .put_sized(key, Arc::clone(&stdout), stdout.len() as u64);
        Ok(stdout)
    }
}

fn parse_log(stdout: &str) -> Vec<CommitRecord> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut fields = line.split(FIELD_SEP);
            Some(CommitRecord {
                hash: fields.next()?.to_string(),
                author: fields.next()?.to_string(),
                date: fields.next()?.to_string(),
                subject: fields.next().unwrap_or_default().to_string(),
            })
        })
        .filter(|c| !c.hash.is_empty())
        .collect()
}

fn parse_blame(stdout: &str) -> Vec<BlameLine> {
    let mut lines = Vec::new();
    let mut commit = String::new();
    let mut author = String::new();
    let mut line_no: u32 = 0;

    for raw in stdout.lines() {
        if let Some(content) = raw.strip_prefix('\t') {
            lines.push(BlameLine {
                line: line_no,
                commit: commit.clone(),
                author: author.clone(),
                content: content.to_string(),
            });
        } else if let Some(name) = raw.strip_prefix("author ") {
            author = name.to_string();
        } else if is_blame_header(raw) {
            let mut fields = raw.split(' ');
            commit = fields
                .next()
                .map(|sha| sha.chars().take(8).collect())
                .unwrap_or_default();
            line_no = fields.nth(1).and_then(|n| n.parse().ok()).unwrap_or(0);
        }
    }
    lines
}

/// A porcelain header starts with a full 40-hex commit id.
fn is_blame_header(line: &str) -> bool {
    let mut fields = line.split(' ');
    fields
        .next()
        .is_some_and(|sha| sha.len() == 40 && sha.chars().all(|c| c.is_ascii_hexdigit()))
}

fn parse_numstat(stdout: &str) -> Vec<FileDiff> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let added = fields.next()?;
            let removed = fields.next()?;
            let path = fields.next()?;
            Some(FileDiff {
                path: path.to_string(),
                // "-" marks a binary file; count it as zero.
                added: added.parse().unwrap_or(0),
                removed: removed.parse().unwrap_or(0),
            })
        })
        .collect()
}
