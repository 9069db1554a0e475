//! Locating and replacing a single named function in source text
//!
//! Each [`Language`] maps to a [`LanguageStrategy`] for extraction and one
//! for replacement. Grammar-backed strategies parse with tree-sitter; the
//! brace and indentation strategies are textual heuristics exposed behind
//! the same interface, so a language can move to a parser by changing its
//! mapping in [`Language::locator`] / [`Language::replacer`].

mod braces;
mod go;
mod indent;
mod tree_walk;

use std::ops::Range;

use tracing::debug;

use crate::{Error, Language, Result};

/// Byte range `[start, end)` of one function declaration in a source buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSpan {
    pub start: usize,
    pub end: usize,
}

impl FunctionSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The spanned text.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range()]
    }

    /// `source` with the spanned text replaced by `replacement`.
    pub fn splice(&self, source: &str, replacement: &str) -> String {
        let mut out = String::with_capacity(source.len() - self.len() + replacement.len());
        out.push_str(&source[..self.start]);
        out.push_str(replacement);
        out.push_str(&source[self.end..]);
        out
    }

    /// Move `start` back over contiguous `//` comment lines directly above
    /// the declaration. A blank line ends the run.
    pub(crate) fn with_leading_comments(self, source: &str) -> Self {
        let mut line_start = line_start_of(source, self.start);
        let mut first_comment = None;

        while line_start > 0 {
            let prev_start = line_start_of(source, line_start - 1);
            let prev = &source[prev_start..line_start - 1];
            if prev.trim_start().starts_with("//") {
                first_comment = Some(prev_start);
                line_start = prev_start;
            } else {
                break;
            }
        }

        match first_comment {
            Some(start) => Self { start, ..self },
            None => self,
        }
    }
}

/// Byte offset of the first character of the line containing `offset`.
pub(crate) fn line_start_of(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Parser grammars walked generically, node by node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeGrammar {
    JavaScript,
}

/// Lexical conventions for the brace-counting heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraceSyntax {
    Go,
    JavaScript,
}

/// How a function's extent is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageStrategy {
    /// Go declarations from a tree-sitter-go parse, with leading comments
    GoDeclarations,
    /// Depth-first search of a tree-sitter parse for a function declaration
    TreeWalk(TreeGrammar),
    /// `def name(` plus indentation comparison
    Indentation,
    /// Declaration token match plus brace counting
    BraceScan(BraceSyntax),
}

impl LanguageStrategy {
    /// Locate the function called `name` in `source`.
    pub fn locate(&self, source: &str, name: &str) -> Result<FunctionSpan> {
        let span = match self {
            Self::GoDeclarations => go::locate(source, name),
            Self::TreeWalk(grammar) => tree_walk::locate(*grammar, source, name),
            Self::Indentation => indent::locate(source, name),
            Self::BraceScan(syntax) => braces::locate(*syntax, source, name),
        }?;
        debug!(strategy = ?self, name, start = span.start, end = span.end, "Located function");
        Ok(span)
    }

    /// True for the textual strategies that do not parse the source.
    pub fn is_heuristic(&self) -> bool {
        matches!(self, Self::Indentation | Self::BraceScan(_))
    }
}

/// Span of `name` in `source` using the language's extraction strategy.
pub fn locate_function(language: Language, source: &str, name: &str) -> Result<FunctionSpan> {
    language.locator().locate(source, name)
}

/// Text of `name` in `source`, leading doc comments included where the
/// language's strategy tracks them.
pub fn extract_function(language: Language, source: &str, name: &str) -> Result<String> {
    let span = locate_function(language, source, name)?;
    Ok(span.text(source).to_string())
}

/// Substitute the function `name` in `source` with `replacement`.
///
/// This is a textual splice: `replacement` is assumed to be a well-formed
/// function. A trailing newline covered by the old span is kept when the
/// replacement lacks one.
pub fn replace_function(
    language: Language,
    source: &str,
    name: &str,
    replacement: &str,
) -> Result<String> {
    let span = language.replacer().locate(source, name)?;
    if span.text(source).ends_with('\n') && !replacement.ends_with('\n') {
        return Ok(span.splice(source, &format!("{replacement}\n")));
    }
    Ok(span.splice(source, replacement))
}

/// Parse `source` with a tree-sitter grammar.
pub(crate) fn parse_tree(
    language: Language,
    grammar: tree_sitter::Language,
    source: &str,
) -> Result<tree_sitter::Tree> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&grammar)
        .map_err(|e| Error::parse(language, e.to_string()))?;
    parser
        .parse(source, None)
        .ok_or_else(|| Error::parse(language, "parser produced no tree"))
}
