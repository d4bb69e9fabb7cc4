//! Go extraction strategy

use std::path::Path;
use std::sync::LazyLock;

use codescope_core::model::{Symbol, SymbolKind};
use regex::Regex;

use super::{brace_block_end, doc_comment_above};

struct Rules {
    function: Regex,
    type_decl: Regex,
    import_single: Regex,
    import_block_entry: Regex,
    variable: Regex,
}

static RULES: LazyLock<Rules> = LazyLock::new(|| Rules {
    function: Regex::new(r"^func\s+(?:\([^)]*\)\s*)?([A-Za-z_]\w*)\s*\(").expect("func pattern"),
    type_decl: Regex::new(r"^type\s+([A-Za-z_]\w*)").expect("type pattern"),
    import_single: Regex::new(r#"^import\s+(?:(\w+)\s+)?"([^"]+)""#).expect("import pattern"),
    import_block_entry: Regex::new(r#"^\s+(?:(\w+)\s+)?"([^"]+)""#).expect("import entry pattern"),
    variable: Regex::new(r"^(?:var|const)\s+([A-Za-z_]\w*)").expect("var pattern"),
});

const COMMENT_PREFIXES: &[&str] = &["//", "/*", "*"];

pub(crate) fn extract(path: &Path, content: &str) -> Vec<Symbol> {
    let lines: Vec<&str> = content.lines().collect();
    let mut symbols = Vec::new();
    let mut in_import_block = false;

    for (idx, line) in lines.iter().enumerate() {
        let line_no = (idx + 1) as u32;

        if in_import_block {
            if line.trim_start().starts_with(')') {
                in_import_block = false;
            } else if let Some(cap) = RULES.import_block_entry.captures(line) {
                symbols.push(import_symbol(path, line, line_no, &cap));
            }
            continue;
        }
        if line.trim_end() == "import (" {
            in_import_block = true;
            continue;
        }

        if let Some(cap) = RULES.function.captures(line) {
            symbols.push(Symbol {
                name: cap[1].to_string(),
                kind: SymbolKind::Function,
                file_path: path.to_path_buf(),
                line: line_no,
                line_end: brace_block_end(&lines, idx),
                signature: line.trim().to_string(),
                doc_comment: doc_comment_above(&lines, idx, COMMENT_PREFIXES),
            });
        } else if let Some(cap) = RULES.type_decl.captures(line) {
            // Struct and interface types carry a brace block; aliases end on
            // their own line.
            let line_end = if line.contains('{') || line.contains("struct") || line.contains("interface") {
                brace_block_end(&lines, idx)
            } else {
                line_no
            };
            symbols.push(Symbol {
                name: cap[1].to_string(),
                kind: SymbolKind::Class,
                file_path: path.to_path_buf(),
                line: line_no,
                line_end,
                signature: line.trim().to_string(),
                doc_comment: doc_comment_above(&lines, idx, COMMENT_PREFIXES),
            });
        } else if let Some(cap) = RULES.import_single.captures(line) {
            symbols.push(import_symbol(path, line, line_no, &cap));
        } else if let Some(cap) = RULES.variable.captures(line) {
            symbols.push(Symbol {
                name: cap[1].to_string(),
                kind: SymbolKind::Variable,
                file_path: path.to_path_buf(),
                line: line_no,
                line_end: line_no,
                signature: line.trim().to_string(),
                doc_comment: None,
            });
        }
    }

    symbols
}

/// Name an import by its alias when present, else the last path segment.
fn import_symbol(path: &Path, line: &str, line_no: u32, cap: &regex::Captures<'_>) -> Symbol {
    let name = match cap.get(1) {
        Some(alias) => alias.as_str().to_string(),
        None => cap[2].rsplit('/').next().unwrap_or(&cap[2]).to_string(),
    };
    Symbol {
        name,
        kind: SymbolKind::Import,
        file_path: path.to_path_buf(),
        line: line_no,
        line_end: line_no,
        signature: line.trim().to_string(),
        doc_comment: None,
    }
}
