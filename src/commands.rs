//! CLI command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use codescope_core::config::Config;
use codescope_core::model::SymbolKind;
use codescope_query::QueryEngine;

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn parse_kind(kind: Option<&str>) -> anyhow::Result<Option<SymbolKind>> {
    match kind {
        None => Ok(None),
        Some("function") => Ok(Some(SymbolKind::Function)),
        Some("class") => Ok(Some(SymbolKind::Class)),
        Some("variable") => Ok(Some(SymbolKind::Variable)),
        Some("import") => Ok(Some(SymbolKind::Import)),
        Some(other) => bail!("unknown kind '{}': expected function, class, variable, or import", other),
    }
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn index(root: PathBuf, recursive: bool, config: Config) -> anyhow::Result<()> {
    let engine = QueryEngine::new(config);
    let stats = engine.index_directory(&root, recursive)?;
    print_json(&stats)
}

pub fn search(
    root: PathBuf,
    query: String,
    kind: Option<String>,
    fuzzy: bool,
    config: Config,
) -> anyhow::Result<()> {
    let kind = parse_kind(kind.as_deref())?;
    let engine = QueryEngine::new(config);
    engine.index_directory(&root, true)?;
    let response = engine.search_symbols(&query, kind, fuzzy)?;
    print_json(&response)
}

pub fn refs(
    root: PathBuf,
    name: String,
    context: Option<usize>,
    config: Config,
) -> anyhow::Result<()> {
    let engine = QueryEngine::new(config);
    engine.index_directory(&root, true)?;
    let response = engine.find_references(&name, context)?;
    print_json(&response)
}

pub async fn watch(root: PathBuf, config: Config) -> anyhow::Result<()> {
    let engine = QueryEngine::new(config);
    let stats = engine.index_directory(&root, true)?;
    tracing::info!(
        "initial index: {} files, {} symbols",
        stats.files_indexed,
        stats.symbols_found
    );

    engine.start_monitoring(&[root.clone()])?;
    tracing::info!("watching {} — Ctrl-C to stop", root.display());
    tokio::signal::ctrl_c().await?;

    engine.stop_monitoring();
    let changes = engine.recent_changes(24);
    tracing::info!("observed {} change(s) this session", changes.len());
    print_json(&changes)
}

pub async fn recent(root: PathBuf, hours: u64, config: Config) -> anyhow::Result<()> {
    // History lives with a running watch; a fresh process watches briefly
    // to catch in-flight editor activity, then reports.
    let engine = QueryEngine::new(config);
    engine.start_monitoring(&[root])?;
    tokio::time::sleep(std::time::Duration::from_millis(1_500)).await;
    engine.stop_monitoring();
    print_json(&engine.recent_changes(hours))
}

pub fn stats(root: PathBuf, config: Config) -> anyhow::Result<()> {
    let engine = QueryEngine::new(config);
    engine.index_directory(&root, true)?;
    print_json(&engine.statistics())
}

pub async fn log(
    root: PathBuf,
    path: String,
    limit: Option<usize>,
    config: Config,
) -> anyhow::Result<()> {
    let engine = QueryEngine::new(config);
    let outcome = engine.file_history(&root, &path, limit).await;
    if let Some(error) = &outcome.error {
        bail!("git query failed: {}", error);
    }
    print_json(&outcome.records)
}

pub async fn blame(root: PathBuf, path: String, config: Config) -> anyhow::Result<()> {
    let engine = QueryEngine::new(config);
    let outcome = engine.blame(&root, &path).await;
    if let Some(error) = &outcome.error {
        bail!("git query failed: {}", error);
    }
    print_json(&outcome.records)
}

pub async fn diff(root: PathBuf, rev: Option<String>, config: Config) -> anyhow::Result<()> {
    let engine = QueryEngine::new(config);
    let outcome = engine.diff_stats(&root, rev.as_deref()).await;
    if let Some(error) = &outcome.error {
        bail!("git query failed: {}", error);
    }
    print_json(&outcome.records)
}
