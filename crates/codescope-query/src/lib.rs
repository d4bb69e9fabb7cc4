//! Codescope Query — the caller-facing query engine
//!
//! A thin façade combining symbol-index reads, change tracking, and cached
//! external-process calls against the git binary.

mod engine;
mod git;

pub use engine::{
    CacheOverview, MonitoringResponse, QueryEngine, ReferencesResponse, SearchResponse,
    StatisticsResponse,
};
pub use git::{BlameLine, CommitRecord, FileDiff, GitClient, GitOutcome};
