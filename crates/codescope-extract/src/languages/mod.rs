//! Language extraction strategies
//!
//! One strategy per supported language, dispatched from the closed
//! [`Language`] enum. Shared helpers cover the two block-extent schemes
//! (brace depth, indentation) and doc-comment association.

pub mod go;
pub mod javascript;
pub mod python;
pub mod rust;

use std::path::Path;

use codescope_core::model::{Language, Symbol};

/// Extract symbols from source text using the language's strategy.
pub fn extract(path: &Path, content: &str, language: Language) -> Vec<Symbol> {
    match language {
        Language::Python => python::extract(path, content),
        Language::Rust => rust::extract(path, content),
        Language::JavaScript | Language::TypeScript => javascript::extract(path, content),
        Language::Go => go::extract(path, content),
        Language::Unsupported => Vec::new(),
    }
}

/// End line (1-based) of a brace-delimited block.
///
/// Tracks nesting depth from the first `{` found on or after the
/// declaration line until depth returns to zero. A `;` before any brace
/// ends the declaration on that line (unit structs, imports, prototypes).
/// An unterminated block runs to end of file.
pub(crate) fn brace_block_end(lines: &[&str], decl_idx: usize) -> u32 {
    let mut depth: i32 = 0;
    let mut seen_open = false;
    for (i, line) in lines.iter().enumerate().skip(decl_idx) {
        for ch in line.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    seen_open = true;
                }
                '}' => depth -= 1,
                ';' if !seen_open => return (i + 1) as u32,
                _ => {}
            }
        }
        if seen_open && depth <= 0 {
            return (i + 1) as u32;
        }
    }
    lines.len() as u32
}

/// End line (1-based) of an indentation-delimited block: the last
/// subsequent line indented deeper than the declaration. Blank lines do
/// not terminate the block.
pub(crate) fn indent_block_end(lines: &[&str], decl_idx: usize) -> u32 {
    let decl_indent = indent_width(lines[decl_idx]);
    let mut end = decl_idx;
    for (i, line) in lines.iter().enumerate().skip(decl_idx + 1) {
        if line.trim().is_empty() {
            continue;
        }
        if indent_width(line) <= decl_indent {
            break;
        }
        end = i;
    }
    (end + 1) as u32
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Nearest contiguous comment block immediately preceding the declaration,
/// attached verbatim. `prefixes` are the language's comment lead-ins.
pub(crate) fn doc_comment_above(
    lines: &[&str],
    decl_idx: usize,
    prefixes: &[&str],
) -> Option<String> {
    let mut collected: Vec<&str> = Vec::new();
    for i in (0..decl_idx).rev() {
        let trimmed = lines[i].trim();
        if trimmed.is_empty() {
            break;
        }
        if prefixes.iter().any(|p| trimmed.starts_with(p)) {
            collected.push(trimmed);
        } else {
            break;
        }
    }
    if collected.is_empty() {
        return None;
    }
    collected.reverse();
    Some(collected.join("\n"))
}

/// Python-style docstring on the lines following a declaration.
pub(crate) fn docstring_below(lines: &[&str], decl_idx: usize) -> Option<String> {
    let mut idx = decl_idx + 1;
    while idx < lines.len() && lines[idx].trim().is_empty() {
        idx += 1;
    }
    let first = lines.get(idx)?.trim();
    let delim = if first.starts_with("\"\"\"") {
        "\"\"\""
    } else if first.starts_with("'''") {
        "'''"
    } else {
        return None;
    };

    // Single-line docstring: closing delimiter on the same line.
    if first.len() >= delim.len() * 2 && first.ends_with(delim) {
        return Some(first.to_string());
    }

    let mut collected = vec![first];
    for line in lines.iter().skip(idx + 1) {
        let trimmed = line.trim();
        collected.push(trimmed);
        if trimmed.contains(delim) {
            return Some(collected.join("\n"));
        }
    }
    // Unterminated docstring: treat as absent rather than swallowing the file.
    None
}
