//! Generic depth-first walk over a tree-sitter concrete syntax tree

use super::{FunctionSpan, TreeGrammar, parse_tree};
use crate::{Error, Language, Result};

impl TreeGrammar {
    fn language(&self) -> Language {
        match self {
            Self::JavaScript => Language::JavaScript,
        }
    }

    fn grammar(&self) -> tree_sitter::Language {
        match self {
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }

    fn declaration_kinds(&self) -> &'static [&'static str] {
        match self {
            Self::JavaScript => &["function_declaration", "generator_function_declaration"],
        }
    }
}

pub(super) fn locate(grammar: TreeGrammar, source: &str, name: &str) -> Result<FunctionSpan> {
    let language = grammar.language();
    let tree = parse_tree(language, grammar.grammar(), source)?;
    let kinds = grammar.declaration_kinds();
    let bytes = source.as_bytes();

    // Pre-order: visit a node, then its children, then its next sibling
    let mut cursor = tree.walk();
    loop {
        let node = cursor.node();
        if kinds.contains(&node.kind())
            && node
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(bytes).ok())
                == Some(name)
        {
            return Ok(FunctionSpan::new(node.start_byte(), node.end_byte()));
        }

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                // A broken tree may have hidden the declaration
                if tree.root_node().has_error() {
                    return Err(Error::parse(language, "source contains syntax errors"));
                }
                return Err(Error::not_found(language, name));
            }
        }
    }
}
