//! Rust extraction strategy

use std::path::Path;
use std::sync::LazyLock;

use codescope_core::model::{Symbol, SymbolKind};
use regex::Regex;

use super::{brace_block_end, doc_comment_above};

struct Rules {
    function: Regex,
    class: Regex,
    import: Regex,
    variable: Regex,
}

static RULES: LazyLock<Rules> = LazyLock::new(|| Rules {
    function: Regex::new(
        r#"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:default\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+([A-Za-z_]\w*)"#,
    )
    .expect("function pattern"),
    class: Regex::new(r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait|union)\s+([A-Za-z_]\w*)")
        .expect("type pattern"),
    import: Regex::new(r"^\s*(?:pub(?:\([^)]*\))?\s+)?use\s+([\w:]+)").expect("use pattern"),
    variable: Regex::new(
        r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:static|const)\s+(?:mut\s+)?([A-Za-z_]\w*)\s*:",
    )
    .expect("static pattern"),
});

const COMMENT_PREFIXES: &[&str] = &["//", "/*", "*", "#["];

pub(crate) fn extract(path: &Path, content: &str) -> Vec<Symbol> {
    let lines: Vec<&str> = content.lines().collect();
    let mut symbols = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_no = (idx + 1) as u32;

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
        } else if let Some(cap) = RULES.class.captures(line) {
            symbols.push(Symbol {
                name: cap[1].to_string(),
                kind: SymbolKind::Class,
                file_path: path.to_path_buf(),
                line: line_no,
                line_end: brace_block_end(&lines, idx),
                signature: line.trim().to_string(),
                doc_comment: doc_comment_above(&lines, idx, COMMENT_PREFIXES),
            });
        } else if let Some(cap) = RULES.import.captures(line) {
            let name = cap[1]
                .trim_end_matches(':')
                .rsplit("::")
                .next()
                .unwrap_or(&cap[1])
                .to_string();
            symbols.push(Symbol {
                name,
                kind: SymbolKind::Import,
                file_path: path.to_path_buf(),
                line: line_no,
                line_end: line_no,
                signature: line.trim().to_string(),
                doc_comment: None,
            });
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn extracts_functions_types_statics_and_uses() {
        let src = "use std::collections::HashMap;\n\
                   \n\
                   const LIMIT: usize = 8;\n\
                   \n\
                   pub struct Pool {\n\
                   \x20   slots: HashMap<u32, u32>,\n\
                   }\n\
                   \n\
                   impl Pool {\n\
                   \x20   pub fn get(&self, id: u32) -> Option<u32> {\n\
                   \x20       self.slots.get(&id).copied()\n\
                   \x20   }\n\
                   }\n";
        let symbols = extract(&PathBuf::from("pool.rs"), src);
        let names: Vec<_> = symbols.iter().map(|s| (s.kind, s.name.as_str())).collect();
        assert_eq!(
            names,
            vec![
                (SymbolKind::Import, "HashMap"),
                (SymbolKind::Variable, "LIMIT"),
                (SymbolKind::Class, "Pool"),
                (SymbolKind::Function, "get"),
            ]
        );
        // Struct block spans to its closing brace; method likewise.
        assert_eq!(symbols[2].line, 5);
        assert_eq!(symbols[2].line_end, 7);
        assert_eq!(symbols[3].line, 10);
        assert_eq!(symbols[3].line_end, 12);
    }

    #[test]
    fn qualified_fn_modifiers() {
        let src = "pub(crate) async fn run() {}\npub const fn size() -> usize { 0 }\nunsafe fn raw() {}\n";
        let symbols = extract(&PathBuf::from("a.rs"), src);
        let names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["run", "size", "raw"]);
        assert!(symbols.iter().all(|s| s.kind == SymbolKind::Function));
    }

    #[test]
    fn doc_comments_attach_through_attributes() {
        let src = "/// Counts things.\n#[inline]\npub fn count() -> u32 { 0 }\n";
        let symbols = extract(&PathBuf::from("a.rs"), src);
        let doc = symbols[0].doc_comment.as_deref().unwrap();
        assert!(doc.contains("Counts things."));
    }

    #[test]
    fn unit_struct_ends_on_its_own_line() {
        let src = "struct Marker;\nstruct Next;\n";
        let symbols = extract(&PathBuf::from("a.rs"), src);
        assert_eq!(symbols[0].line_end, 1);
        assert_eq!(symbols[1].line_end, 2);
    }

    #[test]
    fn use_name_is_last_path_segment() {
        let src = "use crate::cache::TtlCache;\npub use model::Symbol;\n";
        let symbols = extract(&PathBuf::from("a.rs"), src);
        assert_eq!(symbols[0].name, "TtlCache");
        assert_eq!(symbols[1].name, "Symbol");
    }

    #[test]
    fn grouped_use_names_the_prefix() {
        let symbols = extract(&PathBuf::from("a.rs"), "use std::sync::{Arc, Mutex};\n");
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "sync");
        assert_eq!(symbols[0].kind, SymbolKind::Import);
    }
}
