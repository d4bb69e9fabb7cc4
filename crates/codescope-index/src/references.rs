//! Reference scanning
//!
//! References are whole-token name matches over raw file content,
//! classified by a small set of lexical rules. Matching is purely by name;
//! occurrences are never resolved to a declaration in another file.

use std::collections::HashSet;
use std::path::Path;

use codescope_core::model::{Reference, ReferenceKind};

/// Scan one file's content for whole-token occurrences of `name`.
///
/// Occurrences on the file's own declaration lines for that name are the
/// declaration, not a reference, and are skipped.
pub(crate) fn scan_content(
    name: &str,
    path: &Path,
    content: &str,
    context_lines: usize,
    decl_lines: &HashSet<u32>,
) -> Vec<Reference> {
    let lines: Vec<&str> = content.lines().collect();
    let mut references = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_no = (idx + 1) as u32;
        if decl_lines.contains(&line_no) {
            continue;
        }
        for (offset, _) in line.match_indices(name) {
            if !is_whole_token(line, offset, name.len()) {
                continue;
            }
            let after = &line[offset + name.len()..];
            references.push(Reference {
                symbol_name: name.to_string(),
                file_path: path.to_path_buf(),
                line: line_no,
                context: context_around(&lines, idx, context_lines),
                kind: classify(line, after),
            });
            // One reference per line keeps repeated tokens on a line from
            // flooding results.
            break;
        }
    }

    references
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_whole_token(line: &str, offset: usize, len: usize) -> bool {
    let before_ok = line[..offset].chars().next_back().is_none_or(|c| !is_word_char(c));
    let after_ok = line[offset + len..].chars().next().is_none_or(|c| !is_word_char(c));
    before_ok && after_ok
}

fn classify(line: &str, after: &str) -> ReferenceKind {
    if after.trim_start().starts_with('(') {
        return ReferenceKind::Call;
    }
    let trimmed = line.trim_start();
    if trimmed.starts_with("import ")
        || trimmed.starts_with("from ")
        || trimmed.starts_with("use ")
        || trimmed.starts_with("pub use ")
        || line.contains("require(")
    {
        return ReferenceKind::ImportUse;
    }
    if is_assignment(after) {
        return ReferenceKind::Assignment;
    }
    ReferenceKind::Mention
}

fn is_assignment(after: &str) -> bool {
    let t = after.trim_start();
    if [":=", "+=", "-=", "*=", "/="].iter().any(|op| t.starts_with(op)) {
        return true;
    }
    t.starts_with('=') && !t.starts_with("==")
}

fn context_around(lines: &[&str], idx: usize, context_lines: usize) -> String {
    let lo = idx.saturating_sub(context_lines);
    let hi = (idx + context_lines + 1).min(lines.len());
    lines[lo..hi].join("\n")
}
