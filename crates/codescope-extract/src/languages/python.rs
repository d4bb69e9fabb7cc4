//! Python extraction strategy
//!
//! Declaration shapes are matched per line; block extent follows
//! indentation. Doc comments prefer a preceding `#` block, falling back to
//! the docstring attached below the declaration.

use std::path::Path;
use std::sync::LazyLock;

use codescope_core::model::{Symbol, SymbolKind};
use regex::Regex;

use super::{doc_comment_above, docstring_below, indent_block_end};

struct Rules {
    function: Regex,
    class: Regex,
    import: Regex,
    from_import: Regex,
    variable: Regex,
}

static RULES: LazyLock<Rules> = LazyLock::new(|| Rules {
    function: Regex::new(r"^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\(").expect("function pattern"),
    class: Regex::new(r"^\s*class\s+([A-Za-z_]\w*)\s*[:(\s]").expect("class pattern"),
    import: Regex::new(r"^import\s+([\w.]+)(?:\s+as\s+(\w+))?").expect("import pattern"),
    from_import: Regex::new(r"^from\s+[\w.]+\s+import\s+(\w+)(?:\s+as\s+(\w+))?")
        .expect("from-import pattern"),
    variable: Regex::new(r"^([A-Za-z_]\w*)\s*(?::[^=]+)?=\s*[^=\s]").expect("variable pattern"),
});

const COMMENT_PREFIXES: &[&str] = &["#"];

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
                line_end: indent_block_end(&lines, idx),
                signature: line.trim().to_string(),
                doc_comment: doc_comment_above(&lines, idx, COMMENT_PREFIXES)
                    .or_else(|| docstring_below(&lines, idx)),
            });
        } else if let Some(cap) = RULES.class.captures(line) {
            symbols.push(Symbol {
                name: cap[1].to_string(),
                kind: SymbolKind::Class,
                file_path: path.to_path_buf(),
                line: line_no,
                line_end: indent_block_end(&lines, idx),
                signature: line.trim().to_string(),
                doc_comment: doc_comment_above(&lines, idx, COMMENT_PREFIXES)
                    .or_else(|| docstring_below(&lines, idx)),
            });
        } else if let Some(cap) = RULES.from_import.captures(line).or_else(|| RULES.import.captures(line)) {
            let name = cap
                .get(2)
                .or_else(|| cap.get(1))
                .map(|m| m.as_str())
                .unwrap_or_default();
            let name = name.rsplit('.').next().unwrap_or(name);
            symbols.push(Symbol {
                name: name.to_string(),
                kind: SymbolKind::Import,
                file_path: path.to_path_buf(),
                line: line_no,
                line_end: line_no,
                signature: line.trim().to_string(),
                doc_comment: None,
            });
        } else if let Some(cap) = RULES.variable.captures(line) {
            // Module-level assignments only; the pattern is anchored to
            // column zero so class attributes and locals stay out.
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

    fn render(symbols: &[Symbol]) -> String {
        symbols
            .iter()
            .map(|s| format!("{:?} {} @{}-{}", s.kind, s.name, s.line, s.line_end))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    #[test]
    fn extracts_declaration_shapes() {
        let src = "import os\n\
                   from collections import deque\n\
                   \n\
                   VERSION = \"1.0\"\n\
                   \n\
                   def greet(name):\n\
                   \x20   return name\n\
                   \n\
                   class Dog:\n\
                   \x20   def bark(self):\n\
                   \x20       return \"woof\"\n";
        let symbols = extract(&PathBuf::from("pets.py"), src);
        insta::assert_snapshot!(render(&symbols), @"Import os @1-1 | Import deque @2-2 | Variable VERSION @4-4 | Function greet @6-7 | Class Dog @9-11 | Function bark @10-11");
    }

    #[test]
    fn single_line_def() {
        let symbols = extract(&PathBuf::from("a.py"), "def foo(x): return x\n");
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "foo");
        assert_eq!(symbols[0].kind, SymbolKind::Function);
        assert_eq!(symbols[0].line, 1);
        assert_eq!(symbols[0].line_end, 1);
        assert_eq!(symbols[0].signature, "def foo(x): return x");
    }

    #[test]
    fn async_def_and_import_alias() {
        let src = "import numpy as np\nasync def fetch():\n    pass\n";
        let symbols = extract(&PathBuf::from("a.py"), src);
        assert_eq!(symbols[0].name, "np");
        assert_eq!(symbols[0].kind, SymbolKind::Import);
        assert_eq!(symbols[1].name, "fetch");
        assert_eq!(symbols[1].kind, SymbolKind::Function);
    }

    #[test]
    fn hash_comment_block_is_attached() {
        let src = "# Adds one.\n# Really.\ndef inc(x):\n    return x + 1\n";
        let symbols = extract(&PathBuf::from("a.py"), src);
        assert_eq!(symbols[0].doc_comment.as_deref(), Some("# Adds one.\n# Really."));
    }

    #[test]
    fn docstring_attached_when_no_preceding_comment() {
        let src = "def inc(x):\n    \"\"\"Adds one.\"\"\"\n    return x + 1\n";
        let symbols = extract(&PathBuf::from("a.py"), src);
        assert_eq!(symbols[0].doc_comment.as_deref(), Some("\"\"\"Adds one.\"\"\""));
    }

    #[test]
    fn indented_assignments_are_not_module_variables() {
        let src = "class C:\n    attr = 1\n\ndef f():\n    local = 2\n";
        let symbols = extract(&PathBuf::from("a.py"), src);
        let names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["C", "f"]);
    }

    #[test]
    fn comparison_is_not_an_assignment() {
        let symbols = extract(&PathBuf::from("a.py"), "x == 3\n");
        assert!(symbols.is_empty());
    }

    #[test]
    fn shadowed_names_keep_every_site() {
        let src = "def dup():\n    pass\n\ndef dup():\n    pass\n";
        let symbols = extract(&PathBuf::from("a.py"), src);
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].line, 1);
        assert_eq!(symbols[1].line, 4);
    }
}
