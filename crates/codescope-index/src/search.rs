//! Symbol search ranking

use std::sync::Arc;

use codescope_core::model::{FileEntry, Symbol, SymbolKind};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde::Serialize;

/// How a symbol matched the query. Variant order is ranking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchQuality {
    ExactPrefix,
    ExactSubstring,
    Fuzzy,
}

/// One search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolMatch {
    pub symbol: Symbol,
    pub quality: MatchQuality,
}

/// Rank symbols against a query.
///
/// Exact substring matching (case-insensitive) is the default; the fuzzy
/// subsequence fallback runs only when requested and only when no exact
/// hit exists. Ties break by `(file_path, line)` ascending so repeated
/// queries on an unchanged index are reproducible.
pub(crate) fn rank_symbols(
    entries: &[Arc<FileEntry>],
    query: &str,
    kind_filter: Option<SymbolKind>,
    fuzzy: bool,
) -> Vec<SymbolMatch> {
    let needle = query.to_lowercase();
    let mut matches: Vec<SymbolMatch> = Vec::new();

    for entry in entries {
        for symbol in &entry.symbols {
            if kind_filter.is_some_and(|k| k != symbol.kind) {
                continue;
            }
            let name = symbol.name.to_lowercase();
            if name.starts_with(&needle) {
                matches.push(SymbolMatch {
                    symbol: symbol.clone(),
                    quality: MatchQuality::ExactPrefix,
                });
            } else if name.contains(&needle) {
                matches.push(SymbolMatch {
                    symbol: symbol.clone(),
                    quality: MatchQuality::ExactSubstring,
                });
            }
        }
    }

    if matches.is_empty() && fuzzy {
        let matcher = SkimMatcherV2::default();
        for entry in entries {
            for symbol in &entry.symbols {
                if kind_filter.is_some_and(|k| k != symbol.kind) {
                    continue;
                }
                if matcher.fuzzy_match(&symbol.name, query).is_some() {
                    matches.push(SymbolMatch {
                        symbol: symbol.clone(),
                        quality: MatchQuality::Fuzzy,
                    });
                }
            }
        }
    }

    matches.sort_by(|a, b| {
        a.quality
            .cmp(&b.quality)
            .then_with(|| a.symbol.file_path.cmp(&b.symbol.file_path))
            .then_with(|| a.symbol.line.cmp(&b.symbol.line))
    });
    matches
}
