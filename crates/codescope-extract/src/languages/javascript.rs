//! JavaScript / TypeScript extraction strategy
//!
//! The two languages share one rule set; their declaration shapes are
//! identical at the line level.

use std::path::Path;
use std::sync::LazyLock;

use codescope_core::model::{Symbol, SymbolKind};
use regex::Regex;

use super::{brace_block_end, doc_comment_above};

struct Rules {
    function: Regex,
    arrow: Regex,
    class: Regex,
    import_named: Regex,
    import_bare: Regex,
    require: Regex,
    variable: Regex,
}

static RULES: LazyLock<Rules> = LazyLock::new(|| Rules {
    function: Regex::new(
        r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)",
    )
    .expect("function pattern"),
    arrow: Regex::new(
        r"^\s*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*=>|[A-Za-z_$][\w$]*\s*=>)",
    )
    .expect("arrow pattern"),
    class: Regex::new(
        r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+([A-Za-z_$][\w$]*)",
    )
    .expect("class pattern"),
    import_named: Regex::new(
        r"^\s*import\s+(?:type\s+)?(?:\*\s+as\s+([A-Za-z_$][\w$]*)|\{\s*([A-Za-z_$][\w$]*)|([A-Za-z_$][\w$]*))",
    )
    .expect("import pattern"),
    import_bare: Regex::new(r#"^\s*import\s+['"]([^'"]+)['"]"#).expect("bare import pattern"),
    require: Regex::new(
        r"^\s*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*require\s*\(",
    )
    .expect("require pattern"),
    variable: Regex::new(r"^\s*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=")
        .expect("variable pattern"),
});

const COMMENT_PREFIXES: &[&str] = &["//", "/*", "*"];

pub(crate) fn extract(path: &Path, content: &str) -> Vec<Symbol> {
    let lines: Vec<&str> = content.lines().collect();
    let mut symbols = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_no = (idx + 1) as u32;
        let push = |symbols: &mut Vec<Symbol>, name: &str, kind, line_end, doc| {
            symbols.push(Symbol {
                name: name.to_string(),
                kind,
                file_path: path.to_path_buf(),
                line: line_no,
                line_end,
                signature: line.trim().to_string(),
                doc_comment: doc,
            });
        };

        if let Some(cap) = RULES.function.captures(line) {
            push(
                &mut symbols,
                &cap[1],
                SymbolKind::Function,
                brace_block_end(&lines, idx),
                doc_comment_above(&lines, idx, COMMENT_PREFIXES),
            );
        } else if let Some(cap) = RULES.class.captures(line) {
            push(
                &mut symbols,
                &cap[1],
                SymbolKind::Class,
                brace_block_end(&lines, idx),
                doc_comment_above(&lines, idx, COMMENT_PREFIXES),
            );
        } else if let Some(cap) = RULES.import_bare.captures(line) {
            let module = cap[1].rsplit('/').next().unwrap_or(&cap[1]);
            push(&mut symbols, module, SymbolKind::Import, line_no, None);
        } else if let Some(cap) = RULES.import_named.captures(line) {
            let name = cap
                .get(1)
                .or_else(|| cap.get(2))
                .or_else(|| cap.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            push(&mut symbols, name, SymbolKind::Import, line_no, None);
        } else if let Some(cap) = RULES.require.captures(line) {
            push(&mut symbols, &cap[1], SymbolKind::Import, line_no, None);
        } else if let Some(cap) = RULES.arrow.captures(line) {
            push(
                &mut symbols,
                &cap[1],
                SymbolKind::Function,
                brace_block_end(&lines, idx),
                doc_comment_above(&lines, idx, COMMENT_PREFIXES),
            );
        } else if let Some(cap) = RULES.variable.captures(line) {
            push(&mut symbols, &cap[1], SymbolKind::Variable, line_no, None);
        }
    }

    symbols
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn extracts_functions_classes_imports_variables() {
        let src = "import React from 'react';\n\
                   const fs = require('fs');\n\
                   \n\
                   export const MAX = 10;\n\
                   \n\
                   export function render(tree) {\n\
                   \x20 return tree;\n\
                   }\n\
                   \n\
                   const draw = (ctx) => {\n\
                   \x20 ctx.fill();\n\
                   };\n\
                   \n\
                   export default class View {\n\
                   \x20 mount() {}\n\
                   }\n";
        let symbols = extract(&PathBuf::from("view.jsx"), src);
        let kinds: Vec<_> = symbols.iter().map(|s| (s.kind, s.name.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (SymbolKind::Import, "React"),
                (SymbolKind::Import, "fs"),
                (SymbolKind::Variable, "MAX"),
                (SymbolKind::Function, "render"),
                (SymbolKind::Function, "draw"),
                (SymbolKind::Class, "View"),
            ]
        );
    }

    #[test]
    fn arrow_function_is_a_function_not_a_variable() {
        let symbols = extract(&PathBuf::from("a.ts"), "const id = x => x;\n");
        assert_eq!(symbols[0].kind, SymbolKind::Function);
        assert_eq!(symbols[0].name, "id");
    }

    #[test]
    fn namespace_import_uses_alias() {
        let symbols = extract(&PathBuf::from("a.ts"), "import * as path from 'path';\n");
        assert_eq!(symbols[0].name, "path");
        assert_eq!(symbols[0].kind, SymbolKind::Import);
    }

    #[test]
    fn named_import_takes_the_first_binding() {
        let symbols = extract(&PathBuf::from("a.ts"), "import { useState, useEffect } from 'react';\n");
        assert_eq!(symbols[0].name, "useState");
        assert_eq!(symbols[0].kind, SymbolKind::Import);
    }

    #[test]
    fn side_effect_import_names_the_module() {
        let symbols = extract(&PathBuf::from("a.ts"), "import './styles/main.css';\n");
        assert_eq!(symbols[0].name, "main.css");
    }

    #[test]
    fn jsdoc_block_is_attached() {
        let src = "/**\n * Renders the tree.\n */\nfunction render() {\n}\n";
        let symbols = extract(&PathBuf::from("a.js"), src);
        let doc = symbols[0].doc_comment.as_deref().unwrap();
        assert!(doc.contains("Renders the tree."));
    }

    #[test]
    fn generator_and_async_functions() {
        let src = "async function load() {\n}\nfunction* gen() {\n}\n";
        let symbols = extract(&PathBuf::from("a.js"), src);
        let names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["load", "gen"]);
    }
}
