//! Go declarations located through tree-sitter-go

use super::{FunctionSpan, parse_tree};
use crate::{Error, Language, Result};

const DECLARATION_KINDS: [&str; 2] = ["function_declaration", "method_declaration"];

pub(super) fn locate(source: &str, name: &str) -> Result<FunctionSpan> {
    let tree = parse_tree(Language::Go, tree_sitter_go::LANGUAGE.into(), source)?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(Error::parse(
            Language::Go,
            format!("syntax error near byte {}", first_error_offset(root)),
        ));
    }

    let bytes = source.as_bytes();
    let mut cursor = root.walk();
    let found = root.named_children(&mut cursor).find(|node| {
        DECLARATION_KINDS.contains(&node.kind())
            && node
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(bytes).ok())
                == Some(name)
    });

    match found {
        Some(node) => {
            Ok(FunctionSpan::new(node.start_byte(), node.end_byte()).with_leading_comments(source))
        }
        None => Err(Error::not_found(Language::Go, name)),
    }
}

fn first_error_offset(root: tree_sitter::Node<'_>) -> usize {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return node.start_byte();
        }
        // Descend into the first child that contains an error
        let mut descended = false;
        if cursor.goto_first_child() {
            loop {
                if cursor.node().has_error() {
                    descended = true;
                    break;
                }
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }
        if !descended {
            return cursor.node().start_byte();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_method_by_name() {
        let src = "package p\n\ntype T struct{}\n\nfunc (t *T) Run() error {\n\treturn nil\n}\n";
        let span = locate(src, "Run").unwrap();
        assert_eq!(span.text(src), "func (t *T) Run() error {\n\treturn nil\n}");
    }

    #[test]
    fn syntax_error_is_parse_error() {
        let err = locate("package p\nfunc Broken( {\n", "Broken").unwrap_err();
        assert!(matches!(err, Error::ParseError { language: Language::Go, .. }));
    }
}
